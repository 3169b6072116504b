//! Relation resolver: normalized attribute name -> relation patterns

use infofacts_core::{AttributeTable, RelationPattern, Schema};

#[derive(Debug, Clone, Copy)]
pub struct RelationResolver<'a> {
    schema: &'a Schema,
}

impl<'a> RelationResolver<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Patterns for an attribute; empty when the attribute is unmapped
    pub fn resolve(&self, attribute: &str) -> &'a [RelationPattern] {
        self.schema.patterns_for(attribute)
    }

    /// Attributes of `table` that map to at least one pattern
    pub fn mapped<'t>(
        &self,
        table: &'t AttributeTable,
    ) -> impl Iterator<Item = (&'t str, &'a [RelationPattern])> + 't
    where
        'a: 't,
    {
        let resolver = *self;
        table.keys().filter_map(move |attribute| {
            let patterns = resolver.resolve(attribute);
            (!patterns.is_empty()).then_some((attribute.as_str(), patterns))
        })
    }
}
