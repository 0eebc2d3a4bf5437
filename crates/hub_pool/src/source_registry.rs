use crate::store::PoolStore;

/// Seam for the out-of-scope source-preset collaborator (its on-disk format
/// is not part of this crate): given a preset name, return the `(url, tag)`
/// pairs it describes.
pub trait PresetProvider {
    fn sources_for(&self, preset: &str) -> Vec<(String, String)>;
}

/// Bulk-loads a named preset through `add_source`, reporting how many of its
/// entries were genuinely new.
pub fn load_preset(store: &PoolStore, provider: &dyn PresetProvider, preset: &str) -> usize {
    provider
        .sources_for(preset)
        .into_iter()
        .filter(|(url, tag)| store.add_source(url.clone(), tag.clone()))
        .count()
}
