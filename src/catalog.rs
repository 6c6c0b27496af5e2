//! Fixed system-catalog query texts.
//!
//! These are SQL Server specific (sys.* views) and deliberately static: the
//! rest of the crate treats them as opaque strings. Object names and search
//! terms bind through `@P1` parameters; flag columns are cast to BIT so they
//! decode as booleans. Column aliases are part of the tool payload contract.

pub const LIST_DATABASES: &str = "\
SELECT
  name AS databaseName,
  create_date AS createdDate,
  state_desc AS state,
  compatibility_level AS compatibilityLevel
FROM sys.databases
WHERE database_id > 4
ORDER BY name;";

pub const LIST_ALL_DATABASES: &str = "\
SELECT
  name AS databaseName,
  create_date AS createdDate,
  state_desc AS state,
  compatibility_level AS compatibilityLevel
FROM sys.databases
ORDER BY name;";

pub const LIST_TABLES: &str = "\
SELECT
  t.name AS tableName,
  s.name AS schemaName,
  p.rows AS rowCount,
  t.type_desc AS tableType
FROM sys.tables t
INNER JOIN sys.schemas s ON t.schema_id = s.schema_id
LEFT JOIN sys.partitions p ON t.object_id = p.object_id AND p.index_id IN (0, 1)
ORDER BY s.name, t.name;";

pub const TABLE_COLUMNS: &str = "\
SELECT
  c.name AS columnName,
  t.name AS dataType,
  c.max_length AS maxLength,
  c.is_nullable AS isNullable,
  CAST(CASE WHEN pk.column_id IS NOT NULL THEN 1 ELSE 0 END AS BIT) AS isPrimaryKey,
  CAST(CASE WHEN fk.parent_column_id IS NOT NULL THEN 1 ELSE 0 END AS BIT) AS isForeignKey,
  dc.definition AS defaultValue
FROM sys.columns c
INNER JOIN sys.types t ON c.user_type_id = t.user_type_id
LEFT JOIN (
  SELECT ic.object_id, ic.column_id
  FROM sys.index_columns ic
  INNER JOIN sys.indexes i ON ic.object_id = i.object_id AND ic.index_id = i.index_id
  WHERE i.is_primary_key = 1
) pk ON c.object_id = pk.object_id AND c.column_id = pk.column_id
LEFT JOIN sys.foreign_key_columns fk ON c.object_id = fk.parent_object_id AND c.column_id = fk.parent_column_id
LEFT JOIN sys.default_constraints dc ON c.default_object_id = dc.object_id
WHERE c.object_id = OBJECT_ID(@P1)
ORDER BY c.column_id;";

pub const TABLE_FOREIGN_KEYS: &str = "\
SELECT
  fk.name AS constraintName,
  COL_NAME(fkc.parent_object_id, fkc.parent_column_id) AS columnName,
  OBJECT_NAME(fkc.referenced_object_id) AS referencedTable,
  COL_NAME(fkc.referenced_object_id, fkc.referenced_column_id) AS referencedColumn,
  OBJECT_SCHEMA_NAME(fkc.referenced_object_id) AS referencedSchema
FROM sys.foreign_keys fk
INNER JOIN sys.foreign_key_columns fkc ON fk.object_id = fkc.constraint_object_id
WHERE fk.parent_object_id = OBJECT_ID(@P1)
ORDER BY fk.name;";

pub const TABLE_INDEXES: &str = "\
SELECT
  i.name AS indexName,
  COL_NAME(ic.object_id, ic.column_id) AS columnName,
  i.is_unique AS isUnique,
  i.is_primary_key AS isPrimaryKey
FROM sys.indexes i
INNER JOIN sys.index_columns ic ON i.object_id = ic.object_id AND i.index_id = ic.index_id
WHERE i.object_id = OBJECT_ID(@P1)
ORDER BY i.name, ic.key_ordinal;";

pub const LIST_VIEWS: &str = "\
SELECT
  v.name AS viewName,
  s.name AS schemaName,
  v.create_date AS createdDate,
  v.modify_date AS modifiedDate
FROM sys.views v
INNER JOIN sys.schemas s ON v.schema_id = s.schema_id
ORDER BY s.name, v.name;";

pub const LIST_STORED_PROCEDURES: &str = "\
SELECT
  p.name AS procedureName,
  s.name AS schemaName,
  p.create_date AS createdDate,
  p.modify_date AS modifiedDate
FROM sys.procedures p
INNER JOIN sys.schemas s ON p.schema_id = s.schema_id
ORDER BY s.name, p.name;";

pub const PROCEDURE_DEFINITION: &str =
    "SELECT OBJECT_DEFINITION(OBJECT_ID(@P1)) AS definition;";

pub const VIEW_DEFINITION: &str =
    "SELECT OBJECT_DEFINITION(OBJECT_ID(@P1)) AS definition;";

pub const SEARCH_TABLES: &str = "\
SELECT
  t.name AS objectName,
  s.name AS schemaName
FROM sys.tables t
INNER JOIN sys.schemas s ON t.schema_id = s.schema_id
WHERE t.name LIKE @P1
ORDER BY s.name, t.name;";

pub const SEARCH_COLUMNS: &str = "\
SELECT
  c.name AS objectName,
  s.name AS schemaName,
  t.name AS parentObject,
  ty.name AS dataType
FROM sys.columns c
INNER JOIN sys.tables t ON c.object_id = t.object_id
INNER JOIN sys.schemas s ON t.schema_id = s.schema_id
INNER JOIN sys.types ty ON c.user_type_id = ty.user_type_id
WHERE c.name LIKE @P1
ORDER BY s.name, t.name, c.name;";

pub const SEARCH_PROCEDURES: &str = "\
SELECT
  p.name AS objectName,
  s.name AS schemaName
FROM sys.procedures p
INNER JOIN sys.schemas s ON p.schema_id = s.schema_id
WHERE p.name LIKE @P1
ORDER BY s.name, p.name;";

pub const TABLE_DEPENDENCIES: &str = "\
SELECT DISTINCT
  OBJECT_NAME(fk.parent_object_id) AS dependentTable,
  OBJECT_SCHEMA_NAME(fk.parent_object_id) AS dependentSchema,
  fk.name AS constraintName
FROM sys.foreign_keys fk
WHERE fk.referenced_object_id = OBJECT_ID(@P1)
ORDER BY dependentSchema, dependentTable;";

pub const FIND_COLUMN_USAGE: &str = "\
SELECT
  t.name AS tableName,
  s.name AS schemaName,
  c.name AS columnName,
  ty.name AS dataType,
  CAST(CASE WHEN pk.column_id IS NOT NULL THEN 1 ELSE 0 END AS BIT) AS isPrimaryKey,
  CAST(CASE WHEN fk.parent_column_id IS NOT NULL THEN 1 ELSE 0 END AS BIT) AS isForeignKey
FROM sys.columns c
INNER JOIN sys.tables t ON c.object_id = t.object_id
INNER JOIN sys.schemas s ON t.schema_id = s.schema_id
INNER JOIN sys.types ty ON c.user_type_id = ty.user_type_id
LEFT JOIN (
  SELECT ic.object_id, ic.column_id
  FROM sys.index_columns ic
  INNER JOIN sys.indexes i ON ic.object_id = i.object_id AND ic.index_id = i.index_id
  WHERE i.is_primary_key = 1
) pk ON c.object_id = pk.object_id AND c.column_id = pk.column_id
LEFT JOIN sys.foreign_key_columns fk ON c.object_id = fk.parent_object_id AND c.column_id = fk.parent_column_id
WHERE c.name = @P1
ORDER BY s.name, t.name;";

pub const DATABASE_OVERVIEW: &str = "\
SELECT
  (SELECT COUNT(*) FROM sys.tables) AS tableCount,
  (SELECT COUNT(*) FROM sys.views) AS viewCount,
  (SELECT COUNT(*) FROM sys.procedures) AS procedureCount,
  (SELECT COUNT(DISTINCT name) FROM sys.schemas WHERE schema_id > 4) AS schemaCount,
  DB_NAME() AS databaseName;";
