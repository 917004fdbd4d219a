use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Fields, LitStr, Type, parse_macro_input, spanned::Spanned};

/// Derive `tableio::Record` for a struct with named fields.
///
/// Struct attribute: `#[table(name = "...")]` overrides the table name.
/// Field attributes: `#[table(column = "...")]` renames the column,
/// `#[table(flags = "pk,auto,unique,required")]` sets column flags and
/// `#[table(skip)]` leaves the field out (it is rebuilt with `Default`).
#[proc_macro_derive(Record, attributes(table))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_record(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

#[derive(Default)]
struct RecordOptions {
    table_name: Option<String>,
}

#[derive(Default)]
struct FieldOptions {
    column: Option<String>,
    flags: Option<String>,
    skip: bool,
}

fn expand_record(input: DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            input.generics,
            "Record does not support generic structs",
        ));
    }

    let options = parse_record_options(&input.attrs)?;

    let data_struct = match input.data {
        Data::Struct(data) => data,
        _ => {
            return Err(syn::Error::new(
                struct_name.span(),
                "Record can only be derived for structs",
            ));
        }
    };

    let named_fields = match data_struct.fields {
        Fields::Named(fields) => fields,
        _ => {
            return Err(syn::Error::new(
                struct_name.span(),
                "Record requires named fields",
            ));
        }
    };

    let mut descriptors = Vec::<TokenStream2>::new();
    let mut encoders = Vec::<TokenStream2>::new();
    let mut decoders = Vec::<TokenStream2>::new();

    for field in named_fields.named {
        let ident = field
            .ident
            .clone()
            .ok_or_else(|| syn::Error::new(field.span(), "Record requires named fields"))?;
        let field_options = parse_field_options(&field.attrs)?;

        if field_options.skip {
            decoders.push(quote! { #ident: ::core::default::Default::default() });
            continue;
        }

        let field_name = ident.to_string().trim_start_matches("r#").to_string();
        let column_name = field_options
            .column
            .unwrap_or_else(|| field_name.clone());
        let kind = classify(&field.ty);
        let column_type = kind.tokens();
        let optional = is_option(&field.ty);

        let mut descriptor = quote! {
            ::tableio::FieldDescriptor::new(#field_name, #column_name, #column_type)
        };
        if let Some(flags) = field_options.flags {
            descriptor = quote!(#descriptor.with_flags(#flags));
        }
        if optional {
            descriptor = quote!(#descriptor.optional());
        }
        descriptors.push(descriptor);

        let encoder = match kind {
            FieldKind::Float => quote!(encode_float_field),
            _ => quote!(encode_field),
        };
        encoders.push(quote! {
            ::tableio::types::__private::#encoder(&self.#ident, #field_name)?
        });
        decoders.push(quote! {
            #ident: ::tableio::types::__private::decode_field(values.next(), #field_name)?
        });
    }

    if descriptors.is_empty() {
        return Err(syn::Error::new(
            struct_name.span(),
            "Record requires at least one persisted field",
        ));
    }

    let type_name = struct_name.to_string().trim_start_matches("r#").to_string();
    let table_name_fn = options.table_name.map(|table_name| {
        quote! {
            fn table_name() -> ::std::string::String {
                ::std::string::ToString::to_string(#table_name)
            }
        }
    });

    Ok(quote! {
        impl ::tableio::Record for #struct_name {
            const TYPE_NAME: &'static str = #type_name;

            fn fields() -> ::std::vec::Vec<::tableio::FieldDescriptor> {
                ::std::vec![#(#descriptors),*]
            }

            #table_name_fn

            fn to_values(
                &self,
            ) -> ::tableio::Result<::std::vec::Vec<::tableio::types::__private::Value>> {
                ::core::result::Result::Ok(::std::vec![#(#encoders),*])
            }

            fn from_values(
                values: ::std::vec::Vec<::tableio::types::__private::Value>,
            ) -> ::tableio::Result<Self> {
                #[allow(unused_mut, unused_variables)]
                let mut values = values.into_iter();
                ::core::result::Result::Ok(Self {
                    #(#decoders),*
                })
            }
        }
    })
}

/// Column classification of a field type, looking through `Option`
#[derive(Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Boolean,
    String,
    Float,
    Integer,
    Composite,
}

impl FieldKind {
    fn tokens(self) -> TokenStream2 {
        match self {
            FieldKind::Boolean => quote!(::tableio::ColumnType::Boolean),
            FieldKind::String => quote!(::tableio::ColumnType::String),
            FieldKind::Float => quote!(::tableio::ColumnType::Float),
            FieldKind::Integer => quote!(::tableio::ColumnType::Integer),
            FieldKind::Composite => quote!(::tableio::ColumnType::Composite),
        }
    }
}

fn classify(ty: &Type) -> FieldKind {
    match ty {
        Type::Paren(paren) => return classify(paren.elem.as_ref()),
        Type::Group(group) => return classify(group.elem.as_ref()),
        Type::Path(path) => {
            if let Some(segment) = path.path.segments.last() {
                let ident = segment.ident.to_string();
                match ident.as_str() {
                    "bool" => return FieldKind::Boolean,
                    "String" | "str" | "char" => return FieldKind::String,
                    "f32" | "f64" => return FieldKind::Float,
                    "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32"
                    | "u64" | "u128" | "usize" => return FieldKind::Integer,
                    "Option" => {
                        if let Some(inner_ty) = first_generic_type(segment) {
                            return classify(&inner_ty);
                        }
                    }
                    _ => {}
                }
            }
        }
        _ => {}
    }

    FieldKind::Composite
}

fn is_option(ty: &Type) -> bool {
    let Type::Path(path) = ty else {
        return false;
    };
    path.path
        .segments
        .last()
        .is_some_and(|segment| segment.ident == "Option" && first_generic_type(segment).is_some())
}

fn first_generic_type(segment: &syn::PathSegment) -> Option<Type> {
    let syn::PathArguments::AngleBracketed(arguments) = &segment.arguments else {
        return None;
    };

    for arg in &arguments.args {
        if let syn::GenericArgument::Type(ty) = arg {
            return Some(ty.clone());
        }
    }
    None
}

fn parse_record_options(attrs: &[syn::Attribute]) -> syn::Result<RecordOptions> {
    let mut options = RecordOptions::default();

    for attr in attrs {
        if !attr.path().is_ident("table") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let value = meta.value()?;
                let lit: LitStr = value.parse()?;
                options.table_name = Some(lit.value());
                return Ok(());
            }

            Err(meta.error("Unsupported #[table(...)] option on struct. Supported: name = \"...\""))
        })?;
    }

    Ok(options)
}

fn parse_field_options(attrs: &[syn::Attribute]) -> syn::Result<FieldOptions> {
    let mut options = FieldOptions::default();

    for attr in attrs {
        if !attr.path().is_ident("table") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                options.skip = true;
                return Ok(());
            }

            if meta.path.is_ident("column") || meta.path.is_ident("name") {
                let value = meta.value()?;
                let lit: LitStr = value.parse()?;
                options.column = Some(lit.value());
                return Ok(());
            }

            if meta.path.is_ident("flags") {
                let value = meta.value()?;
                let lit: LitStr = value.parse()?;
                options.flags = Some(lit.value());
                return Ok(());
            }

            Err(meta.error(
                "Unsupported #[table(...)] option on field. Supported: column = \"...\", flags = \"...\", skip",
            ))
        })?;

        if options.skip && (options.column.is_some() || options.flags.is_some()) {
            return Err(syn::Error::new(
                attr.span(),
                "#[table(skip)] cannot be combined with column or flags",
            ));
        }
    }

    Ok(options)
}
