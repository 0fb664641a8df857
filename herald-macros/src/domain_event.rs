use proc_macro::TokenStream;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{
    DeriveInput, Ident, LitStr, Result, Token, parse::Parse, parse::ParseStream, parse_macro_input,
};

pub(crate) fn expand(item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);

    match expand_derive(&input) {
        Ok(out) => TokenStream::from(out),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_derive(input: &DeriveInput) -> Result<proc_macro2::TokenStream> {
    let fields_named = match &input.data {
        syn::Data::Struct(syn::DataStruct {
            fields: syn::Fields::Named(f),
            ..
        }) => f,
        syn::Data::Struct(_) => {
            return Err(syn::Error::new(
                input.span(),
                "#[derive(DomainEvent)] supports only named-field struct",
            ));
        }
        _ => {
            return Err(syn::Error::new(
                input.span(),
                "#[derive(DomainEvent)] only on struct",
            ));
        }
    };

    let cfg = parse_event_attrs(&input.attrs)?;

    let Some(name) = cfg.name else {
        return Err(syn::Error::new(
            input.ident.span(),
            "missing #[event(name = \"...\")]",
        ));
    };
    if name.value().is_empty() {
        return Err(syn::Error::new(name.span(), "event name must not be empty"));
    }

    // 发生时间字段路径：显式指定，或回退到名为 occurred_at 的字段
    let occurred_at: Vec<Ident> = match cfg.occurred_at {
        Some(path) => path.into_iter().collect(),
        None => vec![Ident::new("occurred_at", input.ident.span())],
    };

    let root = &occurred_at[0];
    if !has_field_named(fields_named, &root.to_string()) {
        return Err(syn::Error::new(
            root.span(),
            format!(
                "field `{root}` not found; add an `occurred_at` field or use #[event(occurred_at = field.path)]"
            ),
        ));
    }

    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::herald_domain::domain_event::DomainEvent for #ident #ty_generics #where_clause {
            fn name(&self) -> &str {
                #name
            }

            fn occurred_at(&self) -> ::herald_domain::domain_event::Timestamp {
                self.#(#occurred_at).*
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
        }
    })
}

// 判断具名字段结构体中是否存在指定字段名
fn has_field_named(fields: &syn::FieldsNamed, name: &str) -> bool {
    fields
        .named
        .iter()
        .any(|f| f.ident.as_ref().map(|i| i == name).unwrap_or(false))
}

// -------- attribute parsing --------

#[derive(Default)]
struct EventAttrConfig {
    name: Option<LitStr>,
    occurred_at: Option<Punctuated<Ident, Token![.]>>,
}

fn parse_event_attrs(attrs: &[syn::Attribute]) -> Result<EventAttrConfig> {
    let mut cfg = EventAttrConfig::default();

    for attr in attrs.iter().filter(|a| a.path().is_ident("event")) {
        let pairs = attr.parse_args_with(Punctuated::<EventAttrKv, Token![,]>::parse_terminated)?;

        for kv in pairs {
            match kv {
                EventAttrKv::Name { key, value } => {
                    if cfg.name.is_some() {
                        return Err(syn::Error::new(
                            key.span(),
                            "duplicate key 'name' in attribute",
                        ));
                    }
                    cfg.name = Some(value);
                }
                EventAttrKv::OccurredAt { key, path } => {
                    if cfg.occurred_at.is_some() {
                        return Err(syn::Error::new(
                            key.span(),
                            "duplicate key 'occurred_at' in attribute",
                        ));
                    }
                    cfg.occurred_at = Some(path);
                }
            }
        }
    }

    Ok(cfg)
}

enum EventAttrKv {
    Name {
        key: Ident,
        value: LitStr,
    },
    OccurredAt {
        key: Ident,
        path: Punctuated<Ident, Token![.]>,
    },
}

impl Parse for EventAttrKv {
    fn parse(input: ParseStream) -> Result<Self> {
        let key: Ident = input.parse()?;
        let _eq: Token![=] = input.parse()?;

        match key.to_string().as_str() {
            "name" => {
                let value: LitStr = input.parse()?;
                Ok(Self::Name { key, value })
            }
            "occurred_at" => {
                let path = Punctuated::<Ident, Token![.]>::parse_separated_nonempty(input)?;
                Ok(Self::OccurredAt { key, path })
            }
            _ => Err(syn::Error::new(
                key.span(),
                "unknown key; expected 'name' | 'occurred_at'",
            )),
        }
    }
}
