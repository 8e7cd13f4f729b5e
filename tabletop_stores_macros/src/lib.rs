mod entry_store;

use proc_macro::TokenStream;

/// Derive `EntryStore` (and `Readable<EntryData>`) for a wrapper around an
/// existing entry store, usually `ObjectEntryStore`.
///
/// # Usage
///
/// ```ignore
/// #[derive(EntryStore)]
/// #[entry_store(duplicate = "rename_copy")]
/// struct FolderEntry(ObjectEntryStore);
///
/// fn rename_copy(data: &mut EntryData, siblings: &[Arc<FolderEntry>]) {
///     // adjust the copy before it is added
/// }
/// ```
///
/// Structs with named fields wrap their first field unless one is picked:
/// ```ignore
/// #[derive(EntryStore)]
/// #[entry_store(inner = "store")]
/// struct Tracked {
///     label: String,
///     store: ObjectEntryStore,
/// }
/// ```
///
/// The remaining fields start from `Default::default()`.
#[proc_macro_derive(EntryStore, attributes(entry_store))]
pub fn derive_entry_store(input: TokenStream) -> TokenStream {
    entry_store::derive_entry_store(input)
}
