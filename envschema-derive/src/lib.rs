//! Derive macro implementation for envschema

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Field, Fields, Type};

mod attrs;

use attrs::FieldAttrs;

const INTEGER_TYPES: &[&str] = &[
    "u8", "u16", "u32", "u64", "u128", "usize", "i8", "i16", "i32", "i64", "i128", "isize",
];

/// Extract inner type from Option<T>
fn option_inner_type(ty: &Type) -> Option<&Type> {
    if let Type::Path(type_path) = ty {
        if let Some(seg) = type_path.path.segments.last() {
            if seg.ident == "Option" {
                if let syn::PathArguments::AngleBracketed(args) = &seg.arguments {
                    if let Some(syn::GenericArgument::Type(inner)) = args.args.first() {
                        return Some(inner);
                    }
                }
            }
        }
    }
    None
}

/// Last path segment of a type, e.g. `String` for `std::string::String`
fn type_ident(ty: &Type) -> Option<String> {
    match ty {
        Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .map(|seg| seg.ident.to_string()),
        _ => None,
    }
}

/// `EnvSchema` derive macro
///
/// Implements `envschema::EnvSchema` (`schema()` and `from_decoded()`) on
/// structs with named fields.
///
/// # Supported Attributes
///
/// **Struct-level**:
/// - `#[env(prefix = "PREFIX_")]`: Add prefix to all env var names
///
/// **Field-level**:
/// - `#[env(name = "CUSTOM_NAME")]`: Custom environment variable name
/// - `#[env(default)]`: Use `Default::default()` if env var not set
/// - `#[env(default = value)]`: Use explicit default value if env var not set
/// - `#[env(description = "...")]`: Description shown in diagnostics (defaults to the doc comment)
/// - `#[env(examples = [..])]`: Example values shown in diagnostics
/// - `#[env(one_of = [..])]`: Accept only the listed literal values
/// - `#[env(list)]`: Decode a `;`-separated list into `Vec<String>`
/// - `#[env(nested)]`: Field type implements `EnvSchema`; value is JSON text
/// - `#[env(min_length = N, max_length = N)]`: String length bounds
/// - `#[env(minimum = N, maximum = N)]`: Numeric bounds
///
/// # Example
///
/// See the `envschema` crate documentation for usage examples.
#[proc_macro_derive(EnvSchema, attributes(env))]
pub fn derive_env_schema(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    // Parse struct-level attributes (prefix)
    let mut prefix = String::new();

    for attr in &input.attrs {
        if !attr.path().is_ident("env") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("prefix") {
                let value = meta.value()?;
                let lit: syn::LitStr = value.parse()?;
                prefix = lit.value();
                return Ok(());
            }

            Err(meta.error("unsupported struct-level env attribute"))
        })?;
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "EnvSchema only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "EnvSchema only supports structs",
            ));
        }
    };

    let mut properties = Vec::new();
    let mut initializers = Vec::new();

    for field in fields {
        let (property, initializer) = expand_field(field, &prefix)?;
        properties.push(property);
        initializers.push(initializer);
    }

    Ok(quote! {
        impl #impl_generics ::envschema::EnvSchema for #struct_name #ty_generics #where_clause {
            fn schema() -> ::envschema::Schema {
                ::envschema::Schema::object()
                    #(#properties)*
            }

            fn from_decoded(
                value: ::envschema::serde_json::Value,
            ) -> ::core::result::Result<Self, ::envschema::EnvError> {
                #[allow(unused_mut, unused_variables)]
                let mut __map = ::envschema::de::into_object(value)?;
                ::core::result::Result::Ok(Self {
                    #(#initializers),*
                })
            }
        }
    })
}

/// Generate the `.property(..)` call and the field initializer for one field.
fn expand_field(field: &Field, prefix: &str) -> syn::Result<(TokenStream2, TokenStream2)> {
    let Some(field_name) = field.ident.as_ref() else {
        return Err(syn::Error::new_spanned(field, "expected a named field"));
    };
    let field_type = &field.ty;
    let attrs = FieldAttrs::from_field(field)?;

    let option_inner = option_inner_type(field_type);
    let value_type = option_inner.unwrap_or(field_type);

    // Check for invalid combinations
    if option_inner.is_some() && attrs.default.is_some() {
        return Err(syn::Error::new_spanned(
            field,
            "Option<T> fields cannot have default attribute (they default to None automatically)",
        ));
    }
    if attrs.list && attrs.one_of.is_some() {
        return Err(syn::Error::new_spanned(
            field,
            "list and one_of cannot be combined",
        ));
    }
    if attrs.nested && (attrs.default.is_some() || attrs.list || attrs.one_of.is_some()) {
        return Err(syn::Error::new_spanned(
            field,
            "nested fields take their schema from the field type; remove default, list and one_of",
        ));
    }

    // Determine environment variable name
    let base_name = attrs
        .name
        .clone()
        .unwrap_or_else(|| field_name.to_string().to_uppercase());
    let env_var_name = format!("{}{}", prefix, base_name);

    let mut schema = base_schema(field, value_type, &attrs)?;

    if let Some(min) = attrs.min_length {
        schema = quote! { #schema.min_length(#min) };
    }
    if let Some(max) = attrs.max_length {
        schema = quote! { #schema.max_length(#max) };
    }
    if let Some(min) = &attrs.minimum {
        schema = quote! { #schema.minimum((#min) as f64) };
    }
    if let Some(max) = &attrs.maximum {
        schema = quote! { #schema.maximum((#max) as f64) };
    }
    let default = match &attrs.default {
        Some(Some(default_value)) => Some(quote! { ::envschema::de::default_value(#default_value) }),
        Some(None) => Some(quote! {
            ::envschema::de::default_value(<#field_type as ::core::default::Default>::default())
        }),
        None => None,
    };
    if let Some(default) = default {
        // Defaults are injected before decoding, so lists need their raw form
        let default = if attrs.list {
            quote! { ::envschema::de::list_default(#default) }
        } else {
            default
        };
        schema = quote! { #schema.with_default(#default) };
    }
    if let Some(description) = &attrs.description {
        schema = quote! { #schema.with_description(#description) };
    }
    if let Some(examples) = &attrs.examples {
        schema = quote! {
            #schema.with_examples([#(::envschema::de::default_value(#examples)),*])
        };
    }

    let property = if option_inner.is_some() {
        quote! { .optional_property(#env_var_name, #schema) }
    } else {
        quote! { .property(#env_var_name, #schema) }
    };

    let initializer = match (attrs.nested, option_inner) {
        (true, None) => quote! {
            #field_name: <#field_type as ::envschema::EnvSchema>::from_decoded(
                ::envschema::de::take(&mut __map, #env_var_name)
            )?
        },
        (true, Some(inner)) => quote! {
            #field_name: match ::envschema::de::take(&mut __map, #env_var_name) {
                ::envschema::serde_json::Value::Null => ::core::option::Option::None,
                __value => ::core::option::Option::Some(<#inner as ::envschema::EnvSchema>::from_decoded(__value)?),
            }
        },
        (false, _) => quote! {
            #field_name: ::envschema::de::field::<#field_type>(&mut __map, #env_var_name)?
        },
    };

    Ok((property, initializer))
}

/// Schema constructor for a field, before metadata is attached.
fn base_schema(field: &Field, value_type: &Type, attrs: &FieldAttrs) -> syn::Result<TokenStream2> {
    if attrs.nested {
        return Ok(quote! { <#value_type as ::envschema::EnvSchema>::schema() });
    }
    if attrs.list {
        return Ok(quote! { ::envschema::Schema::string_list() });
    }
    if let Some(values) = &attrs.one_of {
        return Ok(quote! {
            ::envschema::Schema::union([
                #(::envschema::Schema::literal(::envschema::de::default_value(#values))),*
            ])
        });
    }

    match type_ident(value_type).as_deref() {
        Some("String") => Ok(quote! { ::envschema::Schema::string() }),
        Some("bool") => Ok(quote! { ::envschema::Schema::boolean() }),
        Some("f32") | Some("f64") => Ok(quote! { ::envschema::Schema::number() }),
        Some(ident) if INTEGER_TYPES.contains(&ident) => Ok(quote! {
            ::envschema::Schema::integer().integer_range(
                <#value_type>::MIN as i128,
                <i128 as ::core::convert::TryFrom<#value_type>>::try_from(<#value_type>::MAX)
                    .unwrap_or(i128::MAX),
            )
        }),
        _ => Err(syn::Error::new_spanned(
            field,
            "unsupported field type; use String, bool, a numeric primitive, or mark the field with `list`, `one_of` or `nested`",
        )),
    }
}
