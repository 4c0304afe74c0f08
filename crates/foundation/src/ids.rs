/// Dense identifier of a feature inside one container (dictionary, module,
/// group). Ids are assigned `0..N` in insertion order and double as indices.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FeatureId(pub u32);

impl FeatureId {
    pub fn new(n: u32) -> Self {
        FeatureId(n)
    }

    pub fn from_index(index: usize) -> Self {
        FeatureId(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for FeatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::FeatureId;

    #[test]
    fn ids_double_as_indices() {
        let id = FeatureId::from_index(7);
        assert_eq!(id, FeatureId::new(7));
        assert_eq!(id.index(), 7);
        assert_eq!(id.to_string(), "#7");
        assert!(FeatureId(1) < FeatureId(2));
    }
}
