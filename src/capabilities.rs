//! Capability policy
//!
//! The client is read-only. Each operation a relational caller might attempt
//! is either supported, accepted as a no-op with a fixed answer, or rejected
//! with [`ClientError::UnsupportedOperation`]. The mapping is a single static
//! table so the same operation always gets the same answer.

use crate::error::{ClientError, ClientResult};
use std::fmt;

/// Operations on a connection or its statements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    // Supported
    CreateStatement,
    PrepareStatement,
    ExecuteQuery,
    GetMetaData,
    IsValid,

    // Accepted, fixed answer
    Close,
    IsClosed,
    GetAutoCommit,
    SetAutoCommit,
    IsReadOnly,
    SetReadOnly,
    GetTransactionIsolation,
    GetCatalog,
    SetCatalog,
    GetSchema,
    SetSchema,
    GetClientInfo,
    SetClientInfo,
    GetWarnings,
    ClearWarnings,

    // Rejected
    Commit,
    Rollback,
    SetSavepoint,
    ReleaseSavepoint,
    RollbackToSavepoint,
    SetTransactionIsolation,
    GetHoldability,
    SetHoldability,
    GetNetworkTimeout,
    SetNetworkTimeout,
    GetTypeMap,
    SetTypeMap,
    NativeSql,
    PrepareCall,
    CreateArrayOf,
    CreateBlob,
    CreateClob,
    CreateNClob,
    CreateSqlXml,
    CreateStruct,
    ExecuteUpdate,
    ExecuteBatch,
}

impl Operation {
    pub const ALL: [Operation; 42] = [
        Operation::CreateStatement,
        Operation::PrepareStatement,
        Operation::ExecuteQuery,
        Operation::GetMetaData,
        Operation::IsValid,
        Operation::Close,
        Operation::IsClosed,
        Operation::GetAutoCommit,
        Operation::SetAutoCommit,
        Operation::IsReadOnly,
        Operation::SetReadOnly,
        Operation::GetTransactionIsolation,
        Operation::GetCatalog,
        Operation::SetCatalog,
        Operation::GetSchema,
        Operation::SetSchema,
        Operation::GetClientInfo,
        Operation::SetClientInfo,
        Operation::GetWarnings,
        Operation::ClearWarnings,
        Operation::Commit,
        Operation::Rollback,
        Operation::SetSavepoint,
        Operation::ReleaseSavepoint,
        Operation::RollbackToSavepoint,
        Operation::SetTransactionIsolation,
        Operation::GetHoldability,
        Operation::SetHoldability,
        Operation::GetNetworkTimeout,
        Operation::SetNetworkTimeout,
        Operation::GetTypeMap,
        Operation::SetTypeMap,
        Operation::NativeSql,
        Operation::PrepareCall,
        Operation::CreateArrayOf,
        Operation::CreateBlob,
        Operation::CreateClob,
        Operation::CreateNClob,
        Operation::CreateSqlXml,
        Operation::CreateStruct,
        Operation::ExecuteUpdate,
        Operation::ExecuteBatch,
    ];
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Transaction isolation levels, as reported by the no-op getter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionIsolation {
    None,
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

/// Fixed answer of a no-op operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixedValue {
    /// Setter or action that does nothing
    Unit,
    Bool(bool),
    Isolation(TransactionIsolation),
    /// Absent catalog, schema or warnings
    Absent,
    /// Empty client-info property set
    EmptyProperties,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Supported,
    NoOp(FixedValue),
    Unsupported,
}

pub fn capability_of(op: Operation) -> Capability {
    use Capability::{NoOp, Supported, Unsupported};
    use Operation as Op;

    match op {
        Op::CreateStatement
        | Op::PrepareStatement
        | Op::ExecuteQuery
        | Op::GetMetaData
        | Op::IsValid => Supported,

        Op::IsClosed => NoOp(FixedValue::Bool(false)),
        Op::GetAutoCommit | Op::IsReadOnly => NoOp(FixedValue::Bool(true)),
        Op::GetTransactionIsolation => NoOp(FixedValue::Isolation(TransactionIsolation::None)),
        Op::GetCatalog | Op::GetSchema | Op::GetWarnings => NoOp(FixedValue::Absent),
        Op::GetClientInfo => NoOp(FixedValue::EmptyProperties),
        Op::Close
        | Op::SetAutoCommit
        | Op::SetReadOnly
        | Op::SetCatalog
        | Op::SetSchema
        | Op::SetClientInfo
        | Op::ClearWarnings => NoOp(FixedValue::Unit),

        Op::Commit
        | Op::Rollback
        | Op::SetSavepoint
        | Op::ReleaseSavepoint
        | Op::RollbackToSavepoint
        | Op::SetTransactionIsolation
        | Op::GetHoldability
        | Op::SetHoldability
        | Op::GetNetworkTimeout
        | Op::SetNetworkTimeout
        | Op::GetTypeMap
        | Op::SetTypeMap
        | Op::NativeSql
        | Op::PrepareCall
        | Op::CreateArrayOf
        | Op::CreateBlob
        | Op::CreateClob
        | Op::CreateNClob
        | Op::CreateSqlXml
        | Op::CreateStruct
        | Op::ExecuteUpdate
        | Op::ExecuteBatch => Unsupported,
    }
}

/// Gate an operation.
///
/// `Ok(None)` means the caller performs it, `Ok(Some(v))` is the fixed answer
/// of a no-op.
pub fn check(op: Operation) -> ClientResult<Option<FixedValue>> {
    match capability_of(op) {
        Capability::Supported => Ok(None),
        Capability::NoOp(value) => Ok(Some(value)),
        Capability::Unsupported => Err(ClientError::unsupported(op.to_string())),
    }
}

/// Optional SQL features reported through the catalog accessor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    AllTablesAreSelectable,
    ReadOnly,
    NullPlusNonNullIsNull,
    NullsAreSortedAtStart,
    NullsAreSortedLow,
    ColumnAliasing,
    GroupBy,
    MinimumSqlGrammar,
    MixedCaseIdentifiers,
    MixedCaseQuotedIdentifiers,
    MultipleOpenResults,
    NonNullableColumns,
    OrderByUnrelated,

    AllProceduresAreCallable,
    Transactions,
    BatchUpdates,
    StoredProcedures,
    Savepoints,
    OuterJoins,
    FullOuterJoins,
    Unions,
    UnionAll,
    SubqueriesInExists,
    SubqueriesInIns,
    CorrelatedSubqueries,
    LikeEscapeClause,
    ExpressionsInOrderBy,
    SelectForUpdate,
    GetGeneratedKeys,
    NamedParameters,
    DataDefinitionInTransactions,
    CoreSqlGrammar,
    ExtendedSqlGrammar,
}

impl Feature {
    pub const ALL: [Feature; 33] = [
        Feature::AllTablesAreSelectable,
        Feature::ReadOnly,
        Feature::NullPlusNonNullIsNull,
        Feature::NullsAreSortedAtStart,
        Feature::NullsAreSortedLow,
        Feature::ColumnAliasing,
        Feature::GroupBy,
        Feature::MinimumSqlGrammar,
        Feature::MixedCaseIdentifiers,
        Feature::MixedCaseQuotedIdentifiers,
        Feature::MultipleOpenResults,
        Feature::NonNullableColumns,
        Feature::OrderByUnrelated,
        Feature::AllProceduresAreCallable,
        Feature::Transactions,
        Feature::BatchUpdates,
        Feature::StoredProcedures,
        Feature::Savepoints,
        Feature::OuterJoins,
        Feature::FullOuterJoins,
        Feature::Unions,
        Feature::UnionAll,
        Feature::SubqueriesInExists,
        Feature::SubqueriesInIns,
        Feature::CorrelatedSubqueries,
        Feature::LikeEscapeClause,
        Feature::ExpressionsInOrderBy,
        Feature::SelectForUpdate,
        Feature::GetGeneratedKeys,
        Feature::NamedParameters,
        Feature::DataDefinitionInTransactions,
        Feature::CoreSqlGrammar,
        Feature::ExtendedSqlGrammar,
    ];
}

pub fn supports(feature: Feature) -> bool {
    matches!(
        feature,
        Feature::AllTablesAreSelectable
            | Feature::ReadOnly
            | Feature::NullPlusNonNullIsNull
            | Feature::NullsAreSortedAtStart
            | Feature::NullsAreSortedLow
            | Feature::ColumnAliasing
            | Feature::GroupBy
            | Feature::MinimumSqlGrammar
            | Feature::MixedCaseIdentifiers
            | Feature::MixedCaseQuotedIdentifiers
            | Feature::MultipleOpenResults
            | Feature::NonNullableColumns
            | Feature::OrderByUnrelated
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_answers() {
        assert_eq!(check(Operation::IsReadOnly).unwrap(), Some(FixedValue::Bool(true)));
        assert_eq!(check(Operation::GetAutoCommit).unwrap(), Some(FixedValue::Bool(true)));
        assert_eq!(check(Operation::IsClosed).unwrap(), Some(FixedValue::Bool(false)));
        assert_eq!(
            check(Operation::GetTransactionIsolation).unwrap(),
            Some(FixedValue::Isolation(TransactionIsolation::None))
        );
        assert_eq!(check(Operation::GetCatalog).unwrap(), Some(FixedValue::Absent));
        assert_eq!(check(Operation::GetSchema).unwrap(), Some(FixedValue::Absent));
        assert_eq!(
            check(Operation::GetClientInfo).unwrap(),
            Some(FixedValue::EmptyProperties)
        );
    }

    #[test]
    fn test_unsupported_names_the_operation() {
        let err = check(Operation::Commit).unwrap_err();
        assert!(matches!(
            &err,
            ClientError::UnsupportedOperation { operation } if operation == "Commit"
        ));
    }

    #[test]
    fn test_supported_operations_pass_through() {
        assert_eq!(check(Operation::ExecuteQuery).unwrap(), None);
        assert_eq!(check(Operation::GetMetaData).unwrap(), None);
    }

    #[test]
    fn test_supported_feature_count() {
        let supported = Feature::ALL.iter().filter(|f| supports(**f)).count();
        assert_eq!(supported, 13);
    }
}
