//! Foreign-key relationship lookups.
//!
//! These back exploratory navigation and are never cached: their repeat
//! rate is low and agents use them to walk the graph interactively.

use std::sync::Arc;

use crate::catalog;
use crate::error::Result;
use crate::executor::Executor;
use crate::models::{self, ForeignKeyInfo, RelatedTables, TableDependency, TableRelationships};

use super::qualify_object_name;

pub struct RelationshipTools {
    executor: Arc<dyn Executor>,
}

impl RelationshipTools {
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self { executor }
    }

    /// Outgoing foreign keys (this table references others) and incoming
    /// references (other tables reference this one).
    pub async fn get_table_relationships(
        &self,
        database: &str,
        table_name: &str,
    ) -> Result<TableRelationships> {
        let table = qualify_object_name(table_name);
        let params: [&str; 1] = [table.as_str()];

        let (outgoing, incoming) = tokio::try_join!(
            self.executor
                .query(Some(database), catalog::TABLE_FOREIGN_KEYS, &params),
            self.executor
                .query(Some(database), catalog::TABLE_DEPENDENCIES, &params),
        )?;

        Ok(TableRelationships {
            outgoing_references: models::from_rows(outgoing)?,
            incoming_references: models::from_rows(incoming)?,
        })
    }

    /// Schema-qualified names of every table directly connected to
    /// `table_name` through a foreign key, in either direction.
    pub async fn get_related_tables(
        &self,
        database: &str,
        table_name: &str,
    ) -> Result<RelatedTables> {
        let TableRelationships {
            outgoing_references,
            incoming_references,
        } = self.get_table_relationships(database, table_name).await?;

        let mut direct_relations: Vec<String> = Vec::new();
        let mut push_unique = |name: String| {
            if !direct_relations.contains(&name) {
                direct_relations.push(name);
            }
        };
        for fk in &outgoing_references {
            push_unique(related_name(fk));
        }
        for dep in &incoming_references {
            push_unique(dependent_name(dep));
        }

        // Indirect relations would require walking the graph transitively;
        // the surface reserves the field.
        Ok(RelatedTables {
            direct_relations,
            indirect_relations: Vec::new(),
        })
    }
}

fn related_name(fk: &ForeignKeyInfo) -> String {
    format!("{}.{}", fk.referenced_schema, fk.referenced_table)
}

fn dependent_name(dep: &TableDependency) -> String {
    format!("{}.{}", dep.dependent_schema, dep.dependent_table)
}
