//! Local bypass: in-process services answer the same way the HTTP backend
//! does.

use dataservice_client::catalog::ServiceField;
use dataservice_client::protocol::encode_rows;
use dataservice_client::transport::ResponseBody;
use dataservice_client::{
    ClientConfig, ClientError, ClientResult, Credentials, DataServiceClient, Driver, FieldType,
    LocalServiceRegistry, QueryRequest, Row, ServiceInformation, StreamHeader, Value,
};
use parking_lot::Mutex;
use std::io::Cursor;
use std::sync::Arc;

const LOCAL: &str = "jdbc:pdi://localhost:9080/kettle?local=true&PARAMETER_HELLO=world";

/// Embedded service with one table of ten integers
#[derive(Default)]
struct Embedded {
    last_request: Arc<Mutex<Option<QueryRequest>>>,
}

impl Embedded {
    fn service() -> ServiceInformation {
        ServiceInformation::new("numbers", vec![ServiceField::new("n", FieldType::Integer)])
    }
}

impl DataServiceClient for Embedded {
    fn status(&self) -> ClientResult<()> {
        Ok(())
    }

    fn service_information(&self) -> ClientResult<Vec<ServiceInformation>> {
        Ok(vec![Embedded::service()])
    }

    fn query(&self, request: &QueryRequest) -> ClientResult<ResponseBody> {
        *self.last_request.lock() = Some(request.clone());
        let rows: Vec<Row> = (0..10).map(|n| Row::new(vec![Value::Integer(n)])).collect();
        let bytes = encode_rows(
            &StreamHeader::for_service("numbers"),
            &Embedded::service().row_meta(),
            &rows,
        )
        .map_err(|e| ClientError::protocol_with("encode failed", e))?;
        Ok(Box::new(Cursor::new(bytes)))
    }
}

#[test]
fn test_local_mode_without_service() {
    let driver = Driver::new(ClientConfig::default(), LocalServiceRegistry::new());
    let err = driver.connect(LOCAL, Credentials::anonymous()).unwrap_err();
    assert!(matches!(err, ClientError::LocalServiceUnavailable));
    assert_eq!(err.kind(), "local_service_unavailable");

    let connection = driver.open(LOCAL, Credentials::anonymous()).unwrap();
    assert!(!connection.is_valid());
    assert!(matches!(
        connection.execute_query("SELECT * FROM numbers", 0),
        Err(ClientError::LocalServiceUnavailable)
    ));
}

#[test]
fn test_local_mode_queries_registered_service() {
    let embedded = Embedded::default();
    let last_request = embedded.last_request.clone();
    let registry = LocalServiceRegistry::with_service(embedded);
    let driver = Driver::new(ClientConfig::default(), registry);

    let connection = driver.connect(LOCAL, Credentials::anonymous()).unwrap();
    let rows = connection
        .execute_query("SELECT * FROM numbers", 4)
        .unwrap()
        .collect_rows()
        .unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[3].get(0), Some(&Value::Integer(3)));

    let seen = last_request.lock().clone().unwrap();
    assert_eq!(seen.max_rows, 4);
    assert_eq!(
        seen.parameters.get("PARAMETER_HELLO").map(String::as_str),
        Some("world")
    );
}

#[test]
fn test_local_catalog_matches_listing() {
    let registry = LocalServiceRegistry::with_service(Embedded::default());
    let connection = Driver::new(ClientConfig::default(), registry)
        .connect(LOCAL, Credentials::anonymous())
        .unwrap();

    let services = connection.service_information().unwrap();
    assert_eq!(services, vec![Embedded::service()]);
    let columns = connection.metadata().columns(None, None, None).unwrap();
    assert_eq!(columns.len(), 1);
    assert_eq!(columns[0].table, "numbers");
    assert_eq!(columns[0].name, "n");
}

#[test]
fn test_registration_after_open_is_seen() {
    let registry = LocalServiceRegistry::new();
    let driver = Driver::new(ClientConfig::default(), registry.clone());
    let connection = driver.open(LOCAL, Credentials::anonymous()).unwrap();
    assert!(!connection.is_valid());

    registry.register(Embedded::default());
    assert!(connection.is_valid());
    assert!(driver.registry().is_registered());
}

#[test]
fn test_registry_is_shared_across_threads() {
    let registry = LocalServiceRegistry::new();
    let writer = registry.clone();
    std::thread::spawn(move || writer.register(Embedded::default()))
        .join()
        .unwrap();
    assert!(registry.is_registered());

    let service: Arc<Box<dyn DataServiceClient>> = registry.service().unwrap();
    assert_eq!(service.service_information().unwrap().len(), 1);
}
