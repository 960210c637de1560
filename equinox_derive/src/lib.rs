extern crate proc_macro;

use proc_macro::TokenStream;
use quote::quote;
use syn;

const BUILDER_ATTRS: [&str; 5] = [
    "builder",
    "builder_field_attr",
    "builder_impl_attr",
    "builder_setter_attr",
    "builder_struct_attr",
];

/// Collects the `#[builder(...)]` fields of a scheduler into a `<Name>Config` struct and
/// generates a `<Name>Builder` whose `build` hands the config to `<Name>::new`.
///
/// `<Name>::new` must take the config and return `Result<<Name>, E>` where `E` converts
/// into [`anyhow::Error`]. Fields without a builder attribute are runtime state and are
/// left for `new` to fill in.
#[proc_macro_derive(
    ScheduleBuilder,
    attributes(
        builder,
        builder_field_attr,
        builder_impl_attr,
        builder_setter_attr,
        builder_struct_attr
    )
)]
pub fn schedule_builder_derive(input: TokenStream) -> TokenStream {
    let ast: syn::DeriveInput = match syn::parse(input) {
        Ok(ast) => ast,
        Err(err) => return err.to_compile_error().into(),
    };

    let builder_fields = match ast.data {
        syn::Data::Struct(syn::DataStruct {
            fields: syn::Fields::Named(syn::FieldsNamed { named, .. }),
            ..
        }) => named
            .into_iter()
            .filter(|field| {
                field
                    .attrs
                    .iter()
                    .any(|attr| BUILDER_ATTRS.iter().any(|name| attr.path.is_ident(name)))
            })
            .collect::<Vec<_>>(),
        _ => {
            return syn::Error::new(
                ast.ident.span(),
                "ScheduleBuilder can only be used on structs with named fields",
            )
            .to_compile_error()
            .into()
        }
    };

    let name = &ast.ident;
    let config_name = syn::Ident::new(&format!("{}Config", name), name.span());

    let builder_name = syn::Ident::new(&format!("{}Builder", name), name.span());
    let builder_name_str = syn::LitStr::new(&builder_name.to_string(), builder_name.span());
    let output = quote! {
        #[derive(derive_builder::Builder, Clone, Debug)]
        #[builder(pattern = "owned", name = #builder_name_str, build_fn(private, name = "build_config"))]
        pub struct #config_name {
            #(#builder_fields),*
        }

        impl #builder_name {
            pub fn build(self) -> anyhow::Result<#name> {
                let config = self.build_config()?;
                ::core::result::Result::Ok(#name::new(config)?)
            }
        }
    };
    output.into()
}
