//! Build a client-side schema from an introspection result

use apollo_compiler::Schema;
use serde::Deserialize;

use crate::errors::GraphQLError;

const BUILT_IN_SCALARS: [&str; 5] = ["String", "Int", "Float", "Boolean", "ID"];
const BUILT_IN_DIRECTIVES: [&str; 5] = ["skip", "include", "deprecated", "specifiedBy", "oneOf"];
const DEFAULT_DEPRECATION_REASON: &str = "No longer supported";

/// The `__schema` object of an introspection response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntrospectionSchema {
    pub query_type: Option<NamedType>,
    pub mutation_type: Option<NamedType>,
    pub subscription_type: Option<NamedType>,
    pub types: Vec<FullType>,
    #[serde(default)]
    pub directives: Option<Vec<DirectiveDefinition>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedType {
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
    List,
    NonNull,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullType {
    pub kind: TypeKind,
    pub name: String,
    pub description: Option<String>,
    pub fields: Option<Vec<FieldDefinition>>,
    pub input_fields: Option<Vec<InputValue>>,
    pub interfaces: Option<Vec<TypeRef>>,
    pub enum_values: Option<Vec<EnumValue>>,
    pub possible_types: Option<Vec<TypeRef>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub name: String,
    pub description: Option<String>,
    pub args: Option<Vec<InputValue>>,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(default)]
    pub is_deprecated: bool,
    pub deprecation_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputValue {
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    pub default_value: Option<String>,
    #[serde(default)]
    pub is_deprecated: bool,
    pub deprecation_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumValue {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_deprecated: bool,
    pub deprecation_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeRef {
    pub kind: TypeKind,
    pub name: Option<String>,
    pub of_type: Option<Box<TypeRef>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectiveDefinition {
    pub name: String,
    pub description: Option<String>,
    pub locations: Vec<String>,
    pub args: Option<Vec<InputValue>>,
    #[serde(default)]
    pub is_repeatable: bool,
}

impl TypeRef {
    /// Render as a GraphQL type reference such as `[String!]!`
    fn render(&self) -> Result<String, GraphQLError> {
        match self.kind {
            TypeKind::NonNull => Ok(format!("{}!", self.inner()?.render()?)),
            TypeKind::List => Ok(format!("[{}]", self.inner()?.render()?)),
            _ => self.name.clone().ok_or_else(|| {
                GraphQLError::Introspection("named type reference without a name".to_string())
            }),
        }
    }

    fn inner(&self) -> Result<&TypeRef, GraphQLError> {
        self.of_type.as_deref().ok_or_else(|| {
            GraphQLError::Introspection(format!("{:?} type reference without ofType", self.kind))
        })
    }

    fn named(&self) -> Result<String, GraphQLError> {
        match self.kind {
            TypeKind::NonNull | TypeKind::List => self.inner()?.named(),
            _ => self.render(),
        }
    }
}

impl IntrospectionSchema {
    /// Build an apollo-compiler schema from this introspection result
    pub fn build(&self) -> Result<Schema, GraphQLError> {
        let sdl = self.to_sdl()?;
        Schema::parse(sdl, "introspection.graphql")
            .map_err(|e| GraphQLError::Schema(Box::new(e)))
    }

    /// Render as SDL text suitable for parsing
    pub fn to_sdl(&self) -> Result<String, GraphQLError> {
        let mut definitions = Vec::new();

        if let Some(schema_definition) = self.schema_definition() {
            definitions.push(schema_definition);
        }

        for directive in self.directives.iter().flatten() {
            if BUILT_IN_DIRECTIVES.contains(&directive.name.as_str())
                || directive.locations.is_empty()
            {
                continue;
            }
            definitions.push(format!(
                "{}directive @{}{}{} on {}",
                description(directive.description.as_deref(), ""),
                directive.name,
                arguments(directive.args.as_deref())?,
                if directive.is_repeatable {
                    " repeatable"
                } else {
                    ""
                },
                directive.locations.join(" | ")
            ));
        }

        for ty in &self.types {
            if ty.name.starts_with("__")
                || (ty.kind == TypeKind::Scalar && BUILT_IN_SCALARS.contains(&ty.name.as_str()))
            {
                continue;
            }
            definitions.push(type_definition(ty)?);
        }

        Ok(definitions.join("\n\n") + "\n")
    }

    /// An explicit schema definition, needed only when the root operation
    /// types differ from what their names would imply
    fn schema_definition(&self) -> Option<String> {
        let roots = [
            ("query", "Query", &self.query_type),
            ("mutation", "Mutation", &self.mutation_type),
            ("subscription", "Subscription", &self.subscription_type),
        ];

        let implicit = roots.iter().all(|(_, default_name, root)| match root {
            Some(root) => root.name == *default_name,
            None => !self.types.iter().any(|ty| ty.name == *default_name),
        });
        if implicit {
            return None;
        }

        let operations = roots
            .iter()
            .filter_map(|(operation, _, root)| {
                root.as_ref()
                    .map(|root| format!("  {operation}: {}", root.name))
            })
            .collect::<Vec<_>>();
        Some(format!("schema {{\n{}\n}}", operations.join("\n")))
    }
}

fn type_definition(ty: &FullType) -> Result<String, GraphQLError> {
    let description_line = description(ty.description.as_deref(), "");
    let name = &ty.name;

    let definition = match ty.kind {
        TypeKind::Scalar => format!("scalar {name}"),
        TypeKind::Object => format!(
            "type {name}{}{}",
            implements(ty.interfaces.as_deref())?,
            fields(ty.fields.as_deref())?
        ),
        TypeKind::Interface => format!(
            "interface {name}{}{}",
            implements(ty.interfaces.as_deref())?,
            fields(ty.fields.as_deref())?
        ),
        TypeKind::Union => {
            let members = ty
                .possible_types
                .iter()
                .flatten()
                .map(TypeRef::named)
                .collect::<Result<Vec<_>, _>>()?;
            if members.is_empty() {
                format!("union {name}")
            } else {
                format!("union {name} = {}", members.join(" | "))
            }
        }
        TypeKind::Enum => {
            let values = ty
                .enum_values
                .iter()
                .flatten()
                .map(|value| {
                    format!(
                        "{}  {}{}",
                        description(value.description.as_deref(), "  "),
                        value.name,
                        deprecated(value.is_deprecated, value.deprecation_reason.as_deref())
                    )
                })
                .collect::<Vec<_>>();
            format!("enum {name}{}", block(&values))
        }
        TypeKind::InputObject => {
            let values = ty
                .input_fields
                .iter()
                .flatten()
                .map(|value| Ok(format!("  {}", input_value(value)?)))
                .collect::<Result<Vec<_>, GraphQLError>>()?;
            format!("input {name}{}", block(&values))
        }
        TypeKind::List | TypeKind::NonNull => {
            return Err(GraphQLError::Introspection(format!(
                "type `{name}` has wrapper kind {:?}",
                ty.kind
            )));
        }
    };

    Ok(format!("{description_line}{definition}"))
}

fn implements(interfaces: Option<&[TypeRef]>) -> Result<String, GraphQLError> {
    let names = interfaces
        .unwrap_or_default()
        .iter()
        .map(TypeRef::named)
        .collect::<Result<Vec<_>, _>>()?;
    if names.is_empty() {
        Ok(String::new())
    } else {
        Ok(format!(" implements {}", names.join(" & ")))
    }
}

fn fields(fields: Option<&[FieldDefinition]>) -> Result<String, GraphQLError> {
    let lines = fields
        .unwrap_or_default()
        .iter()
        .map(|field| {
            Ok(format!(
                "{}  {}{}: {}{}",
                description(field.description.as_deref(), "  "),
                field.name,
                arguments(field.args.as_deref())?,
                field.ty.render()?,
                deprecated(field.is_deprecated, field.deprecation_reason.as_deref())
            ))
        })
        .collect::<Result<Vec<_>, GraphQLError>>()?;
    Ok(block(&lines))
}

fn arguments(args: Option<&[InputValue]>) -> Result<String, GraphQLError> {
    let args = args.unwrap_or_default();
    if args.is_empty() {
        return Ok(String::new());
    }

    let rendered = args
        .iter()
        .map(input_value)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(format!("({})", rendered.join(", ")))
}

/// An argument or input field on one line, its description inline
fn input_value(value: &InputValue) -> Result<String, GraphQLError> {
    let description = match value.description.as_deref() {
        Some(text) if !text.is_empty() => format!("{} ", string_literal(text)),
        _ => String::new(),
    };
    let default_value = value
        .default_value
        .as_deref()
        .map(|default| format!(" = {default}"))
        .unwrap_or_default();
    Ok(format!(
        "{description}{}: {}{default_value}{}",
        value.name,
        value.ty.render()?,
        deprecated(value.is_deprecated, value.deprecation_reason.as_deref())
    ))
}

/// A braced block of lines, or nothing when there are no lines
fn block(lines: &[String]) -> String {
    if lines.is_empty() {
        String::new()
    } else {
        format!(" {{\n{}\n}}", lines.join("\n"))
    }
}

/// A description on its own line at `indent`, or nothing
fn description(description: Option<&str>, indent: &str) -> String {
    match description {
        Some(text) if !text.is_empty() => format!("{indent}{}\n", string_literal(text)),
        _ => String::new(),
    }
}

fn deprecated(is_deprecated: bool, reason: Option<&str>) -> String {
    match (is_deprecated, reason) {
        (false, _) => String::new(),
        (true, None) => " @deprecated".to_string(),
        (true, Some(reason)) if reason == DEFAULT_DEPRECATION_REASON => {
            " @deprecated".to_string()
        }
        (true, Some(reason)) => format!(" @deprecated(reason: {})", string_literal(reason)),
    }
}

/// GraphQL string escapes are a superset of what JSON emits
fn string_literal(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}
