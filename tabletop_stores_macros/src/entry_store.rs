use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Index, LitStr, Member, Path, Type};

pub fn derive_entry_store(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let attrs = parse_struct_attrs(&input);

    let fields = match &input.data {
        Data::Struct(data_struct) => &data_struct.fields,
        _ => panic!("EntryStore derive only supports structs"),
    };

    // The wrapped store is the field named by #[entry_store(inner = "...")],
    // or the first field.
    let (inner_member, inner_ty, construct) = match fields {
        Fields::Unnamed(unnamed) => {
            if unnamed.unnamed.len() != 1 {
                panic!("EntryStore derive on tuple structs needs exactly one field");
            }
            let ty = unnamed.unnamed[0].ty.clone();
            let construct = quote! { Self(__inner) };
            (Member::Unnamed(Index::from(0)), ty, construct)
        }
        Fields::Named(named) => {
            let inner_ident = match &attrs.inner {
                Some(field) => named
                    .named
                    .iter()
                    .filter_map(|f| f.ident.clone())
                    .find(|ident| ident == field)
                    .unwrap_or_else(|| panic!("no field named `{}`", field)),
                None => named
                    .named
                    .first()
                    .and_then(|f| f.ident.clone())
                    .unwrap_or_else(|| panic!("EntryStore derive needs at least one field")),
            };

            let mut inner_ty: Option<Type> = None;
            let mut inits = Vec::new();
            for field in &named.named {
                let Some(ident) = field.ident.as_ref() else {
                    continue;
                };
                if *ident == inner_ident {
                    inner_ty = Some(field.ty.clone());
                    inits.push(quote! { #ident: __inner });
                } else {
                    // Extra fields start from their defaults.
                    inits.push(quote! { #ident: ::core::default::Default::default() });
                }
            }
            let ty = inner_ty.unwrap_or_else(|| panic!("inner field has no type"));
            (Member::Named(inner_ident), ty, quote! { Self { #(#inits),* } })
        }
        Fields::Unit => panic!("EntryStore derive does not support unit structs"),
    };

    let duplicate = attrs.duplicate.map(|path| {
        quote! {
            fn duplicate(
                data: &mut ::tabletop_stores::EntryData,
                siblings: &[::std::sync::Arc<Self>],
            ) {
                #path(data, siblings)
            }
        }
    });

    let expanded = quote! {
        impl #impl_generics ::tabletop_stores::Readable<::tabletop_stores::EntryData>
            for #name #ty_generics #where_clause
        {
            fn subscribe<__F>(&self, handler: __F) -> ::tabletop_stores::Unsubscribe
            where
                __F: Fn(&::tabletop_stores::EntryData) + Send + Sync + 'static,
            {
                ::tabletop_stores::Readable::subscribe(&self.#inner_member, handler)
            }
        }

        impl #impl_generics ::tabletop_stores::EntryStore for #name #ty_generics #where_clause {
            fn from_data(
                data: ::tabletop_stores::EntryData,
            ) -> ::core::result::Result<Self, ::tabletop_stores::StoreError> {
                let __inner = <#inner_ty as ::tabletop_stores::EntryStore>::from_data(data)?;
                ::core::result::Result::Ok(#construct)
            }

            fn id(&self) -> &str {
                ::tabletop_stores::EntryStore::id(&self.#inner_member)
            }

            fn set(&self, data: ::tabletop_stores::EntryData) {
                ::tabletop_stores::EntryStore::set(&self.#inner_member, data)
            }

            fn to_json(&self) -> ::tabletop_stores::EntryData {
                ::tabletop_stores::EntryStore::to_json(&self.#inner_member)
            }

            #duplicate
        }
    };

    TokenStream::from(expanded)
}

#[derive(Default)]
struct StructAttrs {
    inner: Option<String>,
    duplicate: Option<Path>,
}

fn parse_struct_attrs(input: &DeriveInput) -> StructAttrs {
    let mut attrs = StructAttrs::default();

    for attr in &input.attrs {
        if !attr.path().is_ident("entry_store") {
            continue;
        }

        let result = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("inner") {
                let value: LitStr = meta.value()?.parse()?;
                attrs.inner = Some(value.value());
            } else if meta.path.is_ident("duplicate") {
                let value: LitStr = meta.value()?.parse()?;
                attrs.duplicate = Some(value.parse()?);
            } else {
                return Err(meta.error("expected `inner` or `duplicate`"));
            }
            Ok(())
        });
        if let Err(err) = result {
            panic!("invalid #[entry_store] attribute: {}", err);
        }
    }

    attrs
}
