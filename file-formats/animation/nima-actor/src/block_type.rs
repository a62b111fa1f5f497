//! Block type tags used by actor files

/// Type tag of a block in an actor file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BlockType {
    Components = 1,
    ActorNode = 2,
    ActorBone = 3,
    ActorRootBone = 4,
    ActorImage = 5,
    View = 6,
    Animation = 7,
    Animations = 8,
    Atlases = 9,
    Atlas = 10,
    ActorIkTarget = 11,
    ActorEvent = 12,
    CustomIntProperty = 13,
    CustomFloatProperty = 14,
    CustomStringProperty = 15,
    CustomBooleanProperty = 16,
    ColliderRectangle = 17,
    ColliderTriangle = 18,
    ColliderCircle = 19,
    ColliderPolygon = 20,
    ColliderLine = 21,
    ActorImageSequence = 22,
    ActorNodeSolo = 23,
    NestedActorNode = 24,
    NestedActorAssets = 25,
    NestedActorAsset = 26,
    ActorStaticMesh = 27,
}

impl BlockType {
    /// Map a raw tag to a known block type
    pub fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            1 => Self::Components,
            2 => Self::ActorNode,
            3 => Self::ActorBone,
            4 => Self::ActorRootBone,
            5 => Self::ActorImage,
            6 => Self::View,
            7 => Self::Animation,
            8 => Self::Animations,
            9 => Self::Atlases,
            10 => Self::Atlas,
            11 => Self::ActorIkTarget,
            12 => Self::ActorEvent,
            13 => Self::CustomIntProperty,
            14 => Self::CustomFloatProperty,
            15 => Self::CustomStringProperty,
            16 => Self::CustomBooleanProperty,
            17 => Self::ColliderRectangle,
            18 => Self::ColliderTriangle,
            19 => Self::ColliderCircle,
            20 => Self::ColliderPolygon,
            21 => Self::ColliderLine,
            22 => Self::ActorImageSequence,
            23 => Self::ActorNodeSolo,
            24 => Self::NestedActorNode,
            25 => Self::NestedActorAssets,
            26 => Self::NestedActorAsset,
            27 => Self::ActorStaticMesh,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_round_trip_through_repr() {
        for tag in 1..=27u8 {
            let block = BlockType::from_u8(tag).unwrap();
            assert_eq!(block as u8, tag);
        }
    }

    #[test]
    fn test_unknown_tags() {
        assert_eq!(BlockType::from_u8(0), None);
        assert_eq!(BlockType::from_u8(28), None);
        assert_eq!(BlockType::from_u8(255), None);
    }
}
