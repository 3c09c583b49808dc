use super::ItemKind;

/// Decide whether `source` is a conversion candidate and of which kind.
///
/// This is a plain substring search for the factory tokens, so mentions in
/// comments or strings also match. [`extract_call`](super::extract::extract_call)
/// scans real tokens and reports those units as not applicable.
pub fn classify(source: &str) -> Option<ItemKind> {
    ItemKind::ALL
        .into_iter()
        .find(|kind| source.contains(kind.factory_token()))
}
