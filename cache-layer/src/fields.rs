/// The subset of an `Entity` a caller asked for. A bitset rather than an
/// enum set, since cache entries accumulate a *union* of every
/// field-projection they've been fetched with.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FieldSet(u8);

impl FieldSet {
    pub const SUMMARY: FieldSet = FieldSet(1 << 0);
    pub const ARTIFACT: FieldSet = FieldSet(1 << 1);
    pub const RESOURCES: FieldSet = FieldSet(1 << 2);
    pub const CHANNELS: FieldSet = FieldSet(1 << 3);
    pub const ALL: FieldSet = FieldSet(
        FieldSet::SUMMARY.0 | FieldSet::ARTIFACT.0 | FieldSet::RESOURCES.0 | FieldSet::CHANNELS.0,
    );
    pub const NONE: FieldSet = FieldSet(0);

    pub fn union(self, other: FieldSet) -> FieldSet {
        FieldSet(self.0 | other.0)
    }

    /// True if `self` already covers everything `requested` asks for.
    pub fn contains(self, requested: FieldSet) -> bool {
        self.0 & requested.0 == requested.0
    }
}

impl std::ops::BitOr for FieldSet {
    type Output = FieldSet;

    fn bitor(self, rhs: FieldSet) -> FieldSet {
        self.union(rhs)
    }
}
