//! Virtual catalog
//!
//! Presents the service listing as a relational catalog: one fixed schema,
//! one table per service and one column per service field. Every other
//! introspection kind answers with a well-formed empty result.

use super::ServiceInformation;
use crate::capabilities::{self, Feature};
use crate::connection::DRIVER_NAME;
use crate::descriptor::ConnectionDescriptor;
use crate::error::ClientResult;
use crate::transport::DataServiceClient;
use crate::value::FieldType::{Boolean as B, Integer as I, String as S};
use crate::value::{FieldMeta, FieldType, Row, RowMeta, Value};
use regex::Regex;
use std::sync::Arc;

/// The only schema the catalog reports
pub const SCHEMA_NAME: &str = "Kettle";

/// Table type of every service
pub const TABLE_TYPE: &str = "TABLE";

pub const PRODUCT_NAME: &str = "Pentaho Data Services";

/// `columnNullable` in the standard column layout
const COLUMN_NULLABLE: i64 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaRow {
    pub schema: String,
    pub catalog: Option<String>,
}

impl SchemaRow {
    pub fn to_row(&self) -> Row {
        Row::new(vec![
            Value::from(self.schema.as_str()),
            Value::from(self.catalog.clone()),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub catalog: Option<String>,
    pub schema: String,
    pub name: String,
    pub table_type: String,
    pub remarks: Option<String>,
}

impl TableRow {
    pub fn to_row(&self) -> Row {
        Row::new(vec![
            Value::from(self.catalog.clone()),
            Value::from(self.schema.as_str()),
            Value::from(self.name.as_str()),
            Value::from(self.table_type.as_str()),
            Value::from(self.remarks.clone()),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRow {
    pub catalog: Option<String>,
    pub schema: String,
    pub table: String,
    pub name: String,
    pub field_type: FieldType,
    pub size: Option<i32>,
    pub decimal_digits: Option<i32>,
    /// 1-based position within the table
    pub ordinal: usize,
}

impl ColumnRow {
    pub fn sql_type(&self) -> i32 {
        self.field_type.sql_type()
    }

    pub fn type_name(&self) -> &'static str {
        self.field_type.sql_type_name()
    }

    pub fn to_row(&self) -> Row {
        Row::new(vec![
            Value::from(self.catalog.clone()),
            Value::from(self.schema.as_str()),
            Value::from(self.table.as_str()),
            Value::from(self.name.as_str()),
            Value::Integer(i64::from(self.sql_type())),
            Value::from(self.type_name()),
            Value::from(self.size.map(i64::from)),
            Value::from(self.decimal_digits.map(i64::from)),
            Value::Integer(COLUMN_NULLABLE),
            Value::Integer(self.ordinal as i64),
            Value::from("YES"),
        ])
    }
}

/// Introspection result kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKind {
    Schemas,
    Tables,
    Columns,
    Attributes,
    BestRowIdentifier,
    Catalogs,
    ClientInfoProperties,
    ColumnPrivileges,
    CrossReference,
    ExportedKeys,
    FunctionColumns,
    Functions,
    ImportedKeys,
    IndexInfo,
    PrimaryKeys,
    ProcedureColumns,
    Procedures,
    SuperTables,
    SuperTypes,
    TablePrivileges,
    TableTypes,
    TypeInfo,
    Udts,
    VersionColumns,
}

const KEY_COLUMNS: &[(&str, FieldType)] = &[
    ("PKTABLE_CAT", S),
    ("PKTABLE_SCHEM", S),
    ("PKTABLE_NAME", S),
    ("PKCOLUMN_NAME", S),
    ("FKTABLE_CAT", S),
    ("FKTABLE_SCHEM", S),
    ("FKTABLE_NAME", S),
    ("FKCOLUMN_NAME", S),
    ("KEY_SEQ", I),
    ("UPDATE_RULE", I),
    ("DELETE_RULE", I),
    ("FK_NAME", S),
    ("PK_NAME", S),
    ("DEFERRABILITY", I),
];

const ROW_ID_COLUMNS: &[(&str, FieldType)] = &[
    ("SCOPE", I),
    ("COLUMN_NAME", S),
    ("DATA_TYPE", I),
    ("TYPE_NAME", S),
    ("COLUMN_SIZE", I),
    ("BUFFER_LENGTH", I),
    ("DECIMAL_DIGITS", I),
    ("PSEUDO_COLUMN", I),
];

impl MetadataKind {
    /// Kinds the catalog always answers with no rows
    pub const EMPTY: [MetadataKind; 21] = [
        MetadataKind::Attributes,
        MetadataKind::BestRowIdentifier,
        MetadataKind::Catalogs,
        MetadataKind::ClientInfoProperties,
        MetadataKind::ColumnPrivileges,
        MetadataKind::CrossReference,
        MetadataKind::ExportedKeys,
        MetadataKind::FunctionColumns,
        MetadataKind::Functions,
        MetadataKind::ImportedKeys,
        MetadataKind::IndexInfo,
        MetadataKind::PrimaryKeys,
        MetadataKind::ProcedureColumns,
        MetadataKind::Procedures,
        MetadataKind::SuperTables,
        MetadataKind::SuperTypes,
        MetadataKind::TablePrivileges,
        MetadataKind::TableTypes,
        MetadataKind::TypeInfo,
        MetadataKind::Udts,
        MetadataKind::VersionColumns,
    ];

    /// Column layout of this kind of result
    pub fn columns(self) -> &'static [(&'static str, FieldType)] {
        match self {
            MetadataKind::Schemas => &[("TABLE_SCHEM", S), ("TABLE_CATALOG", S)],
            MetadataKind::Tables => &[
                ("TABLE_CAT", S),
                ("TABLE_SCHEM", S),
                ("TABLE_NAME", S),
                ("TABLE_TYPE", S),
                ("REMARKS", S),
            ],
            MetadataKind::Columns => &[
                ("TABLE_CAT", S),
                ("TABLE_SCHEM", S),
                ("TABLE_NAME", S),
                ("COLUMN_NAME", S),
                ("DATA_TYPE", I),
                ("TYPE_NAME", S),
                ("COLUMN_SIZE", I),
                ("DECIMAL_DIGITS", I),
                ("NULLABLE", I),
                ("ORDINAL_POSITION", I),
                ("IS_NULLABLE", S),
            ],
            MetadataKind::Attributes => &[
                ("TYPE_CAT", S),
                ("TYPE_SCHEM", S),
                ("TYPE_NAME", S),
                ("ATTR_NAME", S),
                ("DATA_TYPE", I),
                ("ATTR_TYPE_NAME", S),
            ],
            MetadataKind::BestRowIdentifier | MetadataKind::VersionColumns => ROW_ID_COLUMNS,
            MetadataKind::Catalogs => &[("TABLE_CAT", S)],
            MetadataKind::ClientInfoProperties => &[
                ("NAME", S),
                ("MAX_LEN", I),
                ("DEFAULT_VALUE", S),
                ("DESCRIPTION", S),
            ],
            MetadataKind::ColumnPrivileges => &[
                ("TABLE_CAT", S),
                ("TABLE_SCHEM", S),
                ("TABLE_NAME", S),
                ("COLUMN_NAME", S),
                ("GRANTOR", S),
                ("GRANTEE", S),
                ("PRIVILEGE", S),
                ("IS_GRANTABLE", S),
            ],
            MetadataKind::CrossReference
            | MetadataKind::ExportedKeys
            | MetadataKind::ImportedKeys => KEY_COLUMNS,
            MetadataKind::FunctionColumns => &[
                ("FUNCTION_CAT", S),
                ("FUNCTION_SCHEM", S),
                ("FUNCTION_NAME", S),
                ("COLUMN_NAME", S),
                ("COLUMN_TYPE", I),
                ("DATA_TYPE", I),
                ("TYPE_NAME", S),
            ],
            MetadataKind::Functions => &[
                ("FUNCTION_CAT", S),
                ("FUNCTION_SCHEM", S),
                ("FUNCTION_NAME", S),
                ("REMARKS", S),
                ("FUNCTION_TYPE", I),
                ("SPECIFIC_NAME", S),
            ],
            MetadataKind::IndexInfo => &[
                ("TABLE_CAT", S),
                ("TABLE_SCHEM", S),
                ("TABLE_NAME", S),
                ("NON_UNIQUE", B),
                ("INDEX_QUALIFIER", S),
                ("INDEX_NAME", S),
                ("TYPE", I),
                ("ORDINAL_POSITION", I),
                ("COLUMN_NAME", S),
                ("ASC_OR_DESC", S),
                ("CARDINALITY", I),
                ("PAGES", I),
                ("FILTER_CONDITION", S),
            ],
            MetadataKind::PrimaryKeys => &[
                ("TABLE_CAT", S),
                ("TABLE_SCHEM", S),
                ("TABLE_NAME", S),
                ("COLUMN_NAME", S),
                ("KEY_SEQ", I),
                ("PK_NAME", S),
            ],
            MetadataKind::ProcedureColumns => &[
                ("PROCEDURE_CAT", S),
                ("PROCEDURE_SCHEM", S),
                ("PROCEDURE_NAME", S),
                ("COLUMN_NAME", S),
                ("COLUMN_TYPE", I),
                ("DATA_TYPE", I),
                ("TYPE_NAME", S),
            ],
            MetadataKind::Procedures => &[
                ("PROCEDURE_CAT", S),
                ("PROCEDURE_SCHEM", S),
                ("PROCEDURE_NAME", S),
                ("REMARKS", S),
                ("PROCEDURE_TYPE", I),
                ("SPECIFIC_NAME", S),
            ],
            MetadataKind::SuperTables => &[
                ("TABLE_CAT", S),
                ("TABLE_SCHEM", S),
                ("TABLE_NAME", S),
                ("SUPERTABLE_NAME", S),
            ],
            MetadataKind::SuperTypes => &[
                ("TYPE_CAT", S),
                ("TYPE_SCHEM", S),
                ("TYPE_NAME", S),
                ("SUPERTYPE_CAT", S),
                ("SUPERTYPE_SCHEM", S),
                ("SUPERTYPE_NAME", S),
            ],
            MetadataKind::TablePrivileges => &[
                ("TABLE_CAT", S),
                ("TABLE_SCHEM", S),
                ("TABLE_NAME", S),
                ("GRANTOR", S),
                ("GRANTEE", S),
                ("PRIVILEGE", S),
                ("IS_GRANTABLE", S),
            ],
            MetadataKind::TableTypes => &[("TABLE_TYPE", S)],
            MetadataKind::TypeInfo => &[
                ("TYPE_NAME", S),
                ("DATA_TYPE", I),
                ("PRECISION", I),
                ("LITERAL_PREFIX", S),
                ("LITERAL_SUFFIX", S),
                ("CREATE_PARAMS", S),
                ("NULLABLE", I),
                ("CASE_SENSITIVE", B),
                ("SEARCHABLE", I),
            ],
            MetadataKind::Udts => &[
                ("TYPE_CAT", S),
                ("TYPE_SCHEM", S),
                ("TYPE_NAME", S),
                ("CLASS_NAME", S),
                ("DATA_TYPE", I),
                ("REMARKS", S),
                ("BASE_TYPE", I),
            ],
        }
    }

    pub fn row_meta(self) -> RowMeta {
        RowMeta::new(
            self.columns()
                .iter()
                .map(|(name, field_type)| FieldMeta::new(*name, *field_type))
                .collect(),
        )
    }
}

/// Column layout plus rows, in the standard relational metadata shape
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataResult {
    pub kind: MetadataKind,
    pub row_meta: RowMeta,
    pub rows: Vec<Row>,
}

impl MetadataResult {
    pub fn empty(kind: MetadataKind) -> Self {
        MetadataResult {
            kind,
            row_meta: kind.row_meta(),
            rows: Vec::new(),
        }
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.row_meta.field_names()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// SQL `LIKE` name filter: `%` any run, `_` one character, `\` escapes.
#[derive(Debug, Clone)]
pub enum NamePattern {
    Any,
    Exact(String),
    Like(Regex),
}

impl NamePattern {
    pub fn parse(pattern: Option<&str>) -> Self {
        let Some(pattern) = pattern else {
            return NamePattern::Any;
        };
        if pattern == "%" {
            return NamePattern::Any;
        }

        let mut regex = String::from("^");
        let mut literal = String::new();
        let mut wildcard = false;
        let mut chars = pattern.chars();
        while let Some(c) = chars.next() {
            match c {
                '%' => {
                    wildcard = true;
                    regex.push_str(".*");
                }
                '_' => {
                    wildcard = true;
                    regex.push('.');
                }
                '\\' => {
                    let escaped = chars.next().unwrap_or('\\');
                    literal.push(escaped);
                    regex.push_str(&regex::escape(&escaped.to_string()));
                }
                other => {
                    literal.push(other);
                    regex.push_str(&regex::escape(&other.to_string()));
                }
            }
        }
        regex.push('$');

        if !wildcard {
            return NamePattern::Exact(literal);
        }
        match Regex::new(&format!("(?s){regex}")) {
            Ok(re) => NamePattern::Like(re),
            Err(_) => NamePattern::Exact(pattern.to_string()),
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            NamePattern::Any => true,
            NamePattern::Exact(expected) => expected == name,
            NamePattern::Like(re) => re.is_match(name),
        }
    }
}

/// Catalog accessor bound to one connection's backend.
///
/// Every call fetches a fresh listing; nothing is cached.
pub struct DatabaseMetadata {
    descriptor: Arc<ConnectionDescriptor>,
    client: Arc<dyn DataServiceClient>,
}

impl DatabaseMetadata {
    pub fn new(descriptor: Arc<ConnectionDescriptor>, client: Arc<dyn DataServiceClient>) -> Self {
        DatabaseMetadata { descriptor, client }
    }

    /// The single fixed schema. Never contacts the server.
    pub fn schemas(&self) -> Vec<SchemaRow> {
        vec![SchemaRow {
            schema: SCHEMA_NAME.to_string(),
            catalog: None,
        }]
    }

    pub fn tables(
        &self,
        schema_pattern: Option<&str>,
        table_pattern: Option<&str>,
    ) -> ClientResult<Vec<TableRow>> {
        if !NamePattern::parse(schema_pattern).matches(SCHEMA_NAME) {
            return Ok(Vec::new());
        }
        let tables = NamePattern::parse(table_pattern);
        Ok(self
            .services()?
            .into_iter()
            .filter(|s| tables.matches(&s.name))
            .map(|s| TableRow {
                catalog: None,
                schema: SCHEMA_NAME.to_string(),
                name: s.name,
                table_type: TABLE_TYPE.to_string(),
                remarks: None,
            })
            .collect())
    }

    pub fn columns(
        &self,
        schema_pattern: Option<&str>,
        table_pattern: Option<&str>,
        column_pattern: Option<&str>,
    ) -> ClientResult<Vec<ColumnRow>> {
        if !NamePattern::parse(schema_pattern).matches(SCHEMA_NAME) {
            return Ok(Vec::new());
        }
        let tables = NamePattern::parse(table_pattern);
        let columns = NamePattern::parse(column_pattern);

        let mut rows = Vec::new();
        for service in self.services()? {
            if !tables.matches(&service.name) {
                continue;
            }
            for (idx, field) in service.fields.iter().enumerate() {
                if !columns.matches(&field.name) {
                    continue;
                }
                rows.push(ColumnRow {
                    catalog: None,
                    schema: SCHEMA_NAME.to_string(),
                    table: service.name.clone(),
                    name: field.name.clone(),
                    field_type: field.field_type,
                    size: field.length,
                    decimal_digits: field.precision,
                    ordinal: idx + 1,
                });
            }
        }
        Ok(rows)
    }

    /// Result in the column layout of `kind`.
    ///
    /// Schemas, tables and columns carry the same rows as their dedicated
    /// accessors (unfiltered). Every other kind is empty.
    pub fn introspect(&self, kind: MetadataKind) -> ClientResult<MetadataResult> {
        let rows = match kind {
            MetadataKind::Schemas => self.schemas().iter().map(SchemaRow::to_row).collect(),
            MetadataKind::Tables => self.tables(None, None)?.iter().map(TableRow::to_row).collect(),
            MetadataKind::Columns => self
                .columns(None, None, None)?
                .iter()
                .map(ColumnRow::to_row)
                .collect(),
            _ => Vec::new(),
        };
        Ok(MetadataResult {
            rows,
            ..MetadataResult::empty(kind)
        })
    }

    pub fn supports(&self, feature: Feature) -> bool {
        capabilities::supports(feature)
    }

    pub fn product_name(&self) -> &'static str {
        PRODUCT_NAME
    }

    pub fn driver_name(&self) -> &'static str {
        DRIVER_NAME
    }

    pub fn driver_version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    /// Address the connection was opened with, password-free
    pub fn url(&self) -> String {
        self.descriptor.to_address()
    }

    pub fn user_name(&self) -> Option<&str> {
        self.descriptor.username()
    }

    fn services(&self) -> ClientResult<Vec<ServiceInformation>> {
        self.client.service_information()
    }
}
