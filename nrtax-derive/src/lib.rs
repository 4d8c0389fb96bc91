use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, Lit, LitStr, Meta, Type};

/// Derive macro that generates request field documentation from struct fields.
///
/// For each field, extracts:
/// - Field name (respects `#[serde(rename = "...")]`, overridden by `#[input(name = "...")]`)
/// - Required (false if the type is `Option<T>` or the field has `#[serde(default)]`,
///   unless the field is marked `#[input(required)]`)
/// - Description (from doc comments)
///
/// Fields marked `#[serde(flatten)]` are skipped unless they carry `#[input(name = "...")]`,
/// which is how pattern keys such as `days_present_<year>` are documented.
///
/// Generates an `input_schema() -> &'static [InputField]` method.
#[proc_macro_derive(InputSchema, attributes(serde, input))]
pub fn derive_input_schema(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return syn::Error::new_spanned(name, "InputSchema only supports named fields")
                    .to_compile_error()
                    .into()
            }
        },
        _ => {
            return syn::Error::new_spanned(name, "InputSchema only supports structs")
                .to_compile_error()
                .into()
        }
    };

    let mut field_info = Vec::new();
    for field in fields {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let serde = match SerdeAttrs::from_attrs(&field.attrs) {
            Ok(serde) => serde,
            Err(err) => return err.to_compile_error().into(),
        };
        let input = match InputAttrs::from_attrs(&field.attrs) {
            Ok(input) => input,
            Err(err) => return err.to_compile_error().into(),
        };

        if serde.flatten && input.name.is_none() {
            continue;
        }

        let field_name = input
            .name
            .or(serde.rename)
            .unwrap_or_else(|| ident.to_string());
        let required = input.required
            || (!serde.default && !serde.flatten && !is_option_type(&field.ty));
        let doc = get_doc_comment(&field.attrs);

        field_info.push((field_name, required, doc));
    }

    let field_entries = field_info.iter().map(|(name, required, desc)| {
        quote! {
            InputField {
                name: #name,
                required: #required,
                description: #desc,
            }
        }
    });

    let expanded = quote! {
        impl #name {
            pub fn input_schema() -> &'static [InputField] {
                static SCHEMA: &[InputField] = &[
                    #(#field_entries),*
                ];
                SCHEMA
            }
        }
    };

    TokenStream::from(expanded)
}

#[derive(Default)]
struct SerdeAttrs {
    rename: Option<String>,
    default: bool,
    flatten: bool,
}

impl SerdeAttrs {
    fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut out = SerdeAttrs::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident("serde")) {
            // Other serde keys (with = "...", alias, bound(...)) are skipped, not rejected.
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    let value: LitStr = meta.value()?.parse()?;
                    out.rename = Some(value.value());
                } else if meta.path.is_ident("default") {
                    out.default = true;
                    if meta.input.peek(syn::Token![=]) {
                        let _: LitStr = meta.value()?.parse()?;
                    }
                } else if meta.path.is_ident("flatten") {
                    out.flatten = true;
                } else if meta.input.peek(syn::Token![=]) {
                    let _: syn::Expr = meta.value()?.parse()?;
                } else if meta.input.peek(syn::token::Paren) {
                    let content;
                    syn::parenthesized!(content in meta.input);
                    let _: proc_macro2::TokenStream = content.parse()?;
                }
                Ok(())
            })?;
        }
        Ok(out)
    }
}

#[derive(Default)]
struct InputAttrs {
    name: Option<String>,
    required: bool,
}

impl InputAttrs {
    fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut out = InputAttrs::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident("input")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let value: LitStr = meta.value()?.parse()?;
                    out.name = Some(value.value());
                    Ok(())
                } else if meta.path.is_ident("required") {
                    out.required = true;
                    Ok(())
                } else {
                    Err(meta.error("unsupported input attribute, expected `name` or `required`"))
                }
            })?;
        }
        Ok(out)
    }
}

fn get_doc_comment(attrs: &[Attribute]) -> String {
    attrs
        .iter()
        .filter_map(|attr| {
            if !attr.path().is_ident("doc") {
                return None;
            }
            if let Meta::NameValue(meta) = &attr.meta {
                if let syn::Expr::Lit(expr_lit) = &meta.value {
                    if let Lit::Str(lit_str) = &expr_lit.lit {
                        return Some(lit_str.value().trim().to_string());
                    }
                }
            }
            None
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_option_type(ty: &Type) -> bool {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            return segment.ident == "Option";
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn serde_attrs_read_rename_default_and_flatten() {
        let attrs: Vec<Attribute> = vec![
            parse_quote!(#[serde(rename = "days", default)]),
            parse_quote!(#[serde(with = "rust_decimal::serde::float", bound(serialize = ""))]),
        ];
        let serde = SerdeAttrs::from_attrs(&attrs).unwrap();
        assert_eq!(serde.rename.as_deref(), Some("days"));
        assert!(serde.default);
        assert!(!serde.flatten);
    }

    #[test]
    fn malformed_serde_attr_is_an_error() {
        let attrs: Vec<Attribute> = vec![parse_quote!(#[serde(rename = 42)])];
        assert!(SerdeAttrs::from_attrs(&attrs).is_err());
    }
}
