//! Capability policy is a pure table: same operation, same answer, whatever
//! the connection state.

use dataservice_client::capabilities::{capability_of, check, TransactionIsolation};
use dataservice_client::{
    Capability, ClientConfig, ClientError, Credentials, Driver, FixedValue, LocalServiceRegistry,
    Operation,
};

#[test]
fn test_repeated_checks_agree() {
    for op in Operation::ALL {
        let first = capability_of(op);
        for _ in 0..3 {
            assert_eq!(capability_of(op), first, "{op}");
        }
        match first {
            Capability::Unsupported => assert!(check(op).is_err()),
            Capability::NoOp(value) => assert_eq!(check(op).unwrap(), Some(value)),
            Capability::Supported => assert_eq!(check(op).unwrap(), None),
        }
    }
}

#[test]
fn test_connection_state_does_not_matter() {
    let driver = Driver::new(ClientConfig::default(), LocalServiceRegistry::new());
    // Local mode with nothing registered: the connection is unusable
    let broken = driver
        .open(
            "jdbc:pdi://localhost:9080/kettle?local=true",
            Credentials::anonymous(),
        )
        .unwrap();
    assert!(!broken.is_valid());

    for op in Operation::ALL {
        assert_eq!(broken.capability(op), capability_of(op));
        assert_eq!(broken.check(op).is_ok(), check(op).is_ok());
    }
}

#[test]
fn test_write_and_transaction_operations_rejected() {
    for op in [
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
    ] {
        let err = check(op).unwrap_err();
        assert_eq!(err.kind(), "unsupported_operation");
        assert!(
            matches!(&err, ClientError::UnsupportedOperation { operation } if *operation == op.to_string()),
            "{op}"
        );
    }
}

#[test]
fn test_read_only_answers() {
    assert_eq!(capability_of(Operation::IsReadOnly), Capability::NoOp(FixedValue::Bool(true)));
    assert_eq!(capability_of(Operation::GetAutoCommit), Capability::NoOp(FixedValue::Bool(true)));
    assert_eq!(
        capability_of(Operation::GetTransactionIsolation),
        Capability::NoOp(FixedValue::Isolation(TransactionIsolation::None))
    );
    assert_eq!(capability_of(Operation::SetAutoCommit), Capability::NoOp(FixedValue::Unit));
    assert_eq!(capability_of(Operation::Close), Capability::NoOp(FixedValue::Unit));
    assert_eq!(capability_of(Operation::ExecuteQuery), Capability::Supported);
}
