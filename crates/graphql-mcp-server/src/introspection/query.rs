/// Build the standard introspection query.
///
/// Descriptions are always requested. `include_deprecated` controls whether
/// deprecated arguments and input fields are requested along with their
/// deprecation status; deprecated fields and enum values are always included.
pub fn introspection_query(include_deprecated: bool) -> String {
    let input_value_args = if include_deprecated {
        "(includeDeprecated: true)"
    } else {
        ""
    };
    let input_value_deprecation = if include_deprecated {
        "\n  isDeprecated\n  deprecationReason"
    } else {
        ""
    };

    format!(
        r#"query IntrospectionQuery {{
  __schema {{
    queryType {{ name }}
    mutationType {{ name }}
    subscriptionType {{ name }}
    types {{
      ...FullType
    }}
    directives {{
      name
      description
      locations
      args{input_value_args} {{
        ...InputValue
      }}
    }}
  }}
}}

fragment FullType on __Type {{
  kind
  name
  description
  fields(includeDeprecated: true) {{
    name
    description
    args{input_value_args} {{
      ...InputValue
    }}
    type {{
      ...TypeRef
    }}
    isDeprecated
    deprecationReason
  }}
  inputFields{input_value_args} {{
    ...InputValue
  }}
  interfaces {{
    ...TypeRef
  }}
  enumValues(includeDeprecated: true) {{
    name
    description
    isDeprecated
    deprecationReason
  }}
  possibleTypes {{
    ...TypeRef
  }}
}}

fragment InputValue on __InputValue {{
  name
  description
  type {{ ...TypeRef }}
  defaultValue{input_value_deprecation}
}}

fragment TypeRef on __Type {{
  kind
  name
  ofType {{
    kind
    name
    ofType {{
      kind
      name
      ofType {{
        kind
        name
        ofType {{
          kind
          name
          ofType {{
            kind
            name
            ofType {{
              kind
              name
              ofType {{
                kind
                name
                ofType {{
                  kind
                  name
                  ofType {{
                    kind
                    name
                  }}
                }}
              }}
            }}
          }}
        }}
      }}
    }}
  }}
}}
"#
    )
}
