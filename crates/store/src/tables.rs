// Path: crates/store/src/tables.rs

//! Table definitions and the built-in store tables.
//!
//! Every table's schemas live as a record of `store:Tables`, so observers of
//! the event stream learn each layout from the `SetRecord` that registered
//! it. `store:ResourceIds` marks which resource ids exist.

use crate::primitives::{load, set_record};
use tessera_api::frame::CallFrame;
use tessera_api::state::StateAccess;
use tessera_types::codec::{from_bytes_canonical, to_bytes_canonical};
use tessera_types::error::{SchemaError, StoreError};
use tessera_types::keys::record_state_key;
use tessera_types::lengths::EncodedLengths;
use tessera_types::schema::{DynamicType, StaticType};
use tessera_types::{FieldLayout, Record, ResourceId, ResourceType, Schema, Word};

/// The namespace holding the built-in store tables.
pub const STORE_NAMESPACE: &str = "store";

/// `store:Tables`: table id → field layout, key schema, value schema and names.
pub const TABLES_TABLE: ResourceId = ResourceId::literal(ResourceType::Table, STORE_NAMESPACE, "Tables");

/// `store:ResourceIds`: resource id → exists.
pub const RESOURCE_IDS_TABLE: ResourceId =
    ResourceId::literal(ResourceType::Table, STORE_NAMESPACE, "ResourceIds");

/// The schemas and names of one table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableDefinition {
    /// Schema of the key tuple. Static fields only.
    pub key_schema: Schema,
    /// Schema of the record value.
    pub value_schema: Schema,
    /// Optional key field names.
    pub key_names: Vec<String>,
    /// Optional value field names.
    pub field_names: Vec<String>,
}

impl TableDefinition {
    /// A definition without field names.
    pub fn new(key_schema: Schema, value_schema: Schema) -> Self {
        Self {
            key_schema,
            value_schema,
            key_names: Vec::new(),
            field_names: Vec::new(),
        }
    }

    /// Attaches key and value field names.
    pub fn with_names(mut self, key_names: &[&str], field_names: &[&str]) -> Self {
        self.key_names = key_names.iter().map(|s| s.to_string()).collect();
        self.field_names = field_names.iter().map(|s| s.to_string()).collect();
        self
    }

    /// The packed layout of the record value.
    pub fn field_layout(&self) -> Result<FieldLayout, StoreError> {
        Ok(self.value_schema.field_layout()?)
    }

    /// Number of atoms in a key tuple.
    pub fn key_len(&self) -> usize {
        self.key_schema.static_fields().len()
    }

    /// Checks the key schema is static-only and the names match the schemas.
    pub fn validate(&self) -> Result<(), StoreError> {
        if !self.key_schema.dynamic_fields().is_empty() {
            return Err(SchemaError::Malformed("key schema has dynamic fields".into()).into());
        }
        check_names(&self.key_names, self.key_schema.num_fields())?;
        check_names(&self.field_names, self.value_schema.num_fields())?;
        Ok(())
    }

    /// Encodes the definition as its `store:Tables` record.
    pub fn to_record(&self) -> Result<Record, StoreError> {
        let mut static_data = Vec::with_capacity(96);
        static_data.extend_from_slice(&self.field_layout()?.encode());
        static_data.extend_from_slice(&self.key_schema.encode()?);
        static_data.extend_from_slice(&self.value_schema.encode()?);
        let key_names = to_bytes_canonical(&self.key_names);
        let field_names = to_bytes_canonical(&self.field_names);
        let encoded_lengths =
            EncodedLengths::from_lengths(&[key_names.len() as u64, field_names.len() as u64])?;
        Ok(Record {
            static_data,
            encoded_lengths,
            dynamic_data: [key_names, field_names].concat(),
        })
    }

    /// Decodes a `store:Tables` record.
    pub fn from_record(record: &Record) -> Result<Self, StoreError> {
        let words = record
            .static_data
            .chunks_exact(32)
            .map(|chunk| <Word>::try_from(chunk).map_err(|e| StoreError::Decode(e.to_string())))
            .collect::<Result<Vec<_>, _>>()?;
        let [layout_word, key_word, value_word] = <[Word; 3]>::try_from(words)
            .map_err(|_| StoreError::Decode("table record must hold three schema words".into()))?;
        let key_schema = Schema::decode(&key_word)?;
        let value_schema = Schema::decode(&value_word)?;
        if FieldLayout::decode(&layout_word)? != value_schema.field_layout()? {
            return Err(SchemaError::Malformed("field layout disagrees with value schema".into()).into());
        }
        let layout = tables_layout()?;
        let key_names = decode_names(record.dynamic_field(&layout, 0)?)?;
        let field_names = decode_names(record.dynamic_field(&layout, 1)?)?;
        Ok(Self {
            key_schema,
            value_schema,
            key_names,
            field_names,
        })
    }
}

fn check_names(names: &[String], fields: usize) -> Result<(), StoreError> {
    if !names.is_empty() && names.len() != fields {
        return Err(SchemaError::ValueCount {
            expected: fields,
            got: names.len(),
        }
        .into());
    }
    Ok(())
}

fn decode_names(bytes: &[u8]) -> Result<Vec<String>, StoreError> {
    from_bytes_canonical(bytes).map_err(StoreError::Decode)
}

/// The fixed definition of `store:Tables` itself.
pub fn tables_definition() -> Result<TableDefinition, StoreError> {
    Ok(TableDefinition::new(
        Schema::static_only(vec![StaticType::FixedBytes(32)])?,
        Schema::new(
            vec![StaticType::FixedBytes(32); 3],
            vec![DynamicType::Bytes, DynamicType::Bytes],
        )?,
    )
    .with_names(
        &["tableId"],
        &["fieldLayout", "keySchema", "valueSchema", "keyNames", "fieldNames"],
    ))
}

fn tables_layout() -> Result<FieldLayout, StoreError> {
    tables_definition()?.field_layout()
}

fn resource_ids_definition() -> Result<TableDefinition, StoreError> {
    Ok(TableDefinition::new(
        Schema::static_only(vec![StaticType::FixedBytes(32)])?,
        Schema::static_only(vec![StaticType::Bool])?,
    )
    .with_names(&["resourceId"], &["exists"]))
}

/// A table definition resolved for one store operation.
pub(crate) struct ResolvedTable {
    pub(crate) layout: FieldLayout,
    pub(crate) key_len: usize,
    pub(crate) offchain: bool,
}

impl ResolvedTable {
    pub(crate) fn check_key(&self, key_tuple: &[Word]) -> Result<(), StoreError> {
        if key_tuple.len() != self.key_len {
            return Err(StoreError::InvalidKeyTuple {
                expected: self.key_len,
                got: key_tuple.len(),
            });
        }
        Ok(())
    }
}

/// Reads a table's definition. `store:Tables` always resolves to its built-in definition.
pub fn get_table(state: &dyn StateAccess, table: &ResourceId) -> Result<Option<TableDefinition>, StoreError> {
    if *table == TABLES_TABLE {
        return tables_definition().map(Some);
    }
    match load(state, &TABLES_TABLE, &[table.0])? {
        Some(record) => TableDefinition::from_record(&record).map(Some),
        None => Ok(None),
    }
}

/// Reads a table's field layout.
pub fn get_field_layout(state: &dyn StateAccess, table: &ResourceId) -> Result<FieldLayout, StoreError> {
    resolve(state, table).map(|resolved| resolved.layout)
}

pub(crate) fn resolve(state: &dyn StateAccess, table: &ResourceId) -> Result<ResolvedTable, StoreError> {
    let resource_type = table.resource_type()?;
    if !resource_type.is_table() {
        return Err(StoreError::NotATable(*table));
    }
    let definition = get_table(state, table)?.ok_or(StoreError::UnknownTable(*table))?;
    Ok(ResolvedTable {
        layout: definition.field_layout()?,
        key_len: definition.key_len(),
        offchain: resource_type == ResourceType::OffchainTable,
    })
}

fn write_definition(
    frame: &mut CallFrame<'_>,
    table: &ResourceId,
    definition: &TableDefinition,
) -> Result<(), StoreError> {
    if !table.resource_type()?.is_table() {
        return Err(StoreError::NotATable(*table));
    }
    definition.validate()?;
    let key = record_state_key(&TABLES_TABLE, &[table.0]);
    if frame.state().get(&key)?.is_some() {
        return Err(StoreError::TableExists(*table));
    }
    let record = definition.to_record()?;
    set_record(
        frame,
        &TABLES_TABLE,
        &[table.0],
        &record.static_data,
        record.encoded_lengths,
        &record.dynamic_data,
    )?;
    tracing::info!(
        target: "store",
        table = %table,
        static_width = record.static_data.len(),
        "registered table"
    );
    Ok(())
}

/// Registers a table: writes its definition to `store:Tables` and marks it in
/// `store:ResourceIds`. Fails with `TableExists` if already registered.
pub fn register_table(
    frame: &mut CallFrame<'_>,
    table: &ResourceId,
    definition: &TableDefinition,
) -> Result<(), StoreError> {
    write_definition(frame, table, definition)?;
    set_resource_exists(frame, table)
}

/// Registers `store:Tables` and `store:ResourceIds` themselves.
pub fn register_store_tables(frame: &mut CallFrame<'_>) -> Result<(), StoreError> {
    write_definition(frame, &TABLES_TABLE, &tables_definition()?)?;
    write_definition(frame, &RESOURCE_IDS_TABLE, &resource_ids_definition()?)?;
    set_resource_exists(frame, &TABLES_TABLE)?;
    set_resource_exists(frame, &RESOURCE_IDS_TABLE)
}

/// Marks a resource id as existing.
pub fn set_resource_exists(frame: &mut CallFrame<'_>, id: &ResourceId) -> Result<(), StoreError> {
    set_record(
        frame,
        &RESOURCE_IDS_TABLE,
        &[id.0],
        &[1],
        EncodedLengths::empty(),
        &[],
    )
}

/// Returns true if the resource id has been registered.
pub fn resource_exists(state: &dyn StateAccess, id: &ResourceId) -> Result<bool, StoreError> {
    let record = crate::read::get_record(state, &RESOURCE_IDS_TABLE, &[id.0])?;
    Ok(record.is_some_and(|r| r.static_data.first() == Some(&1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_api::state::MemoryState;
    use tessera_types::StoreEvent;

    fn tasks_definition() -> TableDefinition {
        TableDefinition::new(
            Schema::static_only(vec![StaticType::Uint(8)]).unwrap(),
            Schema::new(vec![StaticType::Bool], vec![DynamicType::String]).unwrap(),
        )
        .with_names(&["id"], &["done", "title"])
    }

    #[test]
    fn test_definition_record_roundtrip() {
        let def = tasks_definition();
        let record = def.to_record().unwrap();
        assert_eq!(record.static_data.len(), 96);
        assert_eq!(TableDefinition::from_record(&record).unwrap(), def);
    }

    #[test]
    fn test_register_and_resolve() {
        let base = MemoryState::new();
        let mut frame = CallFrame::new(&base);
        register_store_tables(&mut frame).unwrap();
        let tasks = ResourceId::new(ResourceType::Table, "app", "Tasks").unwrap();
        register_table(&mut frame, &tasks, &tasks_definition()).unwrap();

        assert_eq!(get_table(frame.state(), &tasks).unwrap(), Some(tasks_definition()));
        assert_eq!(get_field_layout(frame.state(), &tasks).unwrap().static_width(), 1);
        assert!(resource_exists(frame.state(), &tasks).unwrap());
        assert!(resource_exists(frame.state(), &TABLES_TABLE).unwrap());

        // Two definition writes plus two existence marks for the store tables,
        // then one of each for Tasks.
        let sets: Vec<_> = frame
            .events()
            .iter()
            .filter(|e| matches!(e, StoreEvent::SetRecord { .. }))
            .collect();
        assert_eq!(sets.len(), 6);
        assert_eq!(*frame.events()[4].table(), TABLES_TABLE);
    }

    #[test]
    fn test_register_rejects_duplicates_and_non_tables() {
        let base = MemoryState::new();
        let mut frame = CallFrame::new(&base);
        register_store_tables(&mut frame).unwrap();
        let tasks = ResourceId::new(ResourceType::Table, "app", "Tasks").unwrap();
        register_table(&mut frame, &tasks, &tasks_definition()).unwrap();
        assert!(matches!(
            register_table(&mut frame, &tasks, &tasks_definition()),
            Err(StoreError::TableExists(_))
        ));
        let system = ResourceId::new(ResourceType::System, "app", "Tasks").unwrap();
        assert!(matches!(
            register_table(&mut frame, &system, &tasks_definition()),
            Err(StoreError::NotATable(_))
        ));
        let unknown = ResourceId::new(ResourceType::Table, "app", "Nope").unwrap();
        assert!(matches!(
            get_field_layout(frame.state(), &unknown),
            Err(StoreError::UnknownTable(_))
        ));
    }

    #[test]
    fn test_definition_validation() {
        let bad_key = TableDefinition::new(
            Schema::new(vec![], vec![DynamicType::Bytes]).unwrap(),
            Schema::default(),
        );
        assert!(matches!(bad_key.validate(), Err(StoreError::Schema(SchemaError::Malformed(_)))));
        let bad_names = tasks_definition().with_names(&["id"], &["done"]);
        assert!(matches!(
            bad_names.validate(),
            Err(StoreError::Schema(SchemaError::ValueCount { expected: 2, got: 1 }))
        ));
    }
}
