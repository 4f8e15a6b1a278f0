use crate::installable::InstallableEntry;

/// Entries split by whether exactly one category claimed them.
#[derive(Debug, Default)]
pub struct Partition {
    pub installable: Vec<InstallableEntry>,
    pub mismatched: Vec<InstallableEntry>,
}

/// Split entries, keeping their relative order on both sides.
pub fn partition(entries: impl IntoIterator<Item = InstallableEntry>) -> Partition {
    let (installable, mismatched): (Vec<_>, Vec<_>) = entries
        .into_iter()
        .partition(InstallableEntry::is_installable);
    Partition {
        installable,
        mismatched,
    }
}
