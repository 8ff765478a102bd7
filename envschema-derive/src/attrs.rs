//! Attribute parsing for `#[env(...)]` annotations.
//!
//! This module extracts and validates schema attributes from struct fields
//! during macro expansion.

use syn::{Attribute, Expr, ExprArray, Field, Lit, LitInt};

/// Parsed `#[env(...)]` attributes from a struct field.
#[derive(Debug, Default)]
pub struct FieldAttrs {
    /// Custom environment variable name override.
    ///
    /// If `None`, the field name is converted to UPPER_SNAKE_CASE.
    pub name: Option<String>,

    /// Default value strategy:
    /// - `None`: Field is required (no default)
    /// - `Some(None)`: Use `Default::default()`
    /// - `Some(Some(tokens))`: Use explicit token stream as default value
    pub default: Option<Option<proc_macro2::TokenStream>>,

    /// Description shown in diagnostics; falls back to the doc comment.
    pub description: Option<String>,

    pub examples: Option<Vec<Expr>>,

    /// Literal constants of a union (`one_of = ["a", "b"]`).
    pub one_of: Option<Vec<Expr>>,

    /// Decode the variable as a delimited list.
    pub list: bool,

    /// Field type implements `EnvSchema` itself.
    pub nested: bool,

    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub minimum: Option<Expr>,
    pub maximum: Option<Expr>,
}

impl FieldAttrs {
    /// Extract and parse `#[env(...)]` attributes from a struct field.
    ///
    /// Attributes other than `env` and `doc` are left for other macros.
    pub fn from_field(field: &Field) -> syn::Result<Self> {
        let mut attrs = Self::default();

        for attr in &field.attrs {
            if !attr.path().is_ident("env") {
                continue;
            }

            attr.parse_nested_meta(|meta| {
                // name = "..."
                if meta.path.is_ident("name") {
                    attrs.name = Some(parse_str(&meta)?);
                    return Ok(());
                }

                // default or default = value
                if meta.path.is_ident("default") {
                    if meta.input.peek(syn::Token![=]) {
                        let value = meta.value()?;
                        let tokens: Expr = value.parse()?;
                        attrs.default = Some(Some(quote::quote!(#tokens)));
                    } else {
                        attrs.default = Some(None);
                    }
                    return Ok(());
                }

                if meta.path.is_ident("description") {
                    attrs.description = Some(parse_str(&meta)?);
                    return Ok(());
                }

                // examples = [..] / one_of = [..]
                if meta.path.is_ident("examples") {
                    attrs.examples = Some(parse_array(&meta)?);
                    return Ok(());
                }
                if meta.path.is_ident("one_of") {
                    attrs.one_of = Some(parse_array(&meta)?);
                    return Ok(());
                }

                if meta.path.is_ident("list") {
                    attrs.list = true;
                    return Ok(());
                }
                if meta.path.is_ident("nested") {
                    attrs.nested = true;
                    return Ok(());
                }

                if meta.path.is_ident("min_length") {
                    attrs.min_length = Some(parse_usize(&meta)?);
                    return Ok(());
                }
                if meta.path.is_ident("max_length") {
                    attrs.max_length = Some(parse_usize(&meta)?);
                    return Ok(());
                }
                if meta.path.is_ident("minimum") {
                    attrs.minimum = Some(meta.value()?.parse()?);
                    return Ok(());
                }
                if meta.path.is_ident("maximum") {
                    attrs.maximum = Some(meta.value()?.parse()?);
                    return Ok(());
                }

                Err(meta.error("unsupported env attribute"))
            })?;
        }

        if attrs.description.is_none() {
            attrs.description = doc_comment(&field.attrs);
        }

        Ok(attrs)
    }
}

fn parse_str(meta: &syn::meta::ParseNestedMeta<'_>) -> syn::Result<String> {
    match meta.value()?.parse::<Lit>()? {
        Lit::Str(s) => Ok(s.value()),
        lit => Err(syn::Error::new_spanned(lit, "expected a string literal")),
    }
}

fn parse_usize(meta: &syn::meta::ParseNestedMeta<'_>) -> syn::Result<usize> {
    meta.value()?.parse::<LitInt>()?.base10_parse()
}

fn parse_array(meta: &syn::meta::ParseNestedMeta<'_>) -> syn::Result<Vec<Expr>> {
    let array: ExprArray = meta.value()?.parse()?;
    Ok(array.elems.into_iter().collect())
}

/// Join the lines of `///` comments into one sentence.
pub fn doc_comment(attrs: &[Attribute]) -> Option<String> {
    let lines: Vec<String> = attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            syn::Meta::NameValue(nv) => match &nv.value {
                Expr::Lit(syn::ExprLit {
                    lit: Lit::Str(s), ..
                }) => Some(s.value().trim().to_string()),
                _ => None,
            },
            _ => None,
        })
        .filter(|line| !line.is_empty())
        .collect();

    if lines.is_empty() {
        None
    } else {
        Some(lines.join(" "))
    }
}
