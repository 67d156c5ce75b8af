//! Staff service checking departments against a clinic service reached over HTTP.

use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use clinic_fleet::lifecycle::{ClinicFleet, FleetConfig};
use clinic_fleet::model::{DepartmentId, EmployeeCreate, StaffRole};
use fleet_framework::{AuthContext, ServiceClient, ServiceError};
use serde_json::json;

/// Out-of-process clinic service that knows department 1 only and fails on department 3.
async fn spawn_clinic() -> String {
    let app = Router::new().route(
        "/departments/{id}",
        get(|Path(id): Path<u32>| async move {
            match id {
                1 => (
                    StatusCode::OK,
                    axum::Json(json!({
                        "id": 1,
                        "name": "Cardiology",
                        "facility": null,
                        "doctorIds": []
                    })),
                ),
                3 => (StatusCode::SERVICE_UNAVAILABLE, axum::Json(json!({}))),
                _ => (StatusCode::NOT_FOUND, axum::Json(json!({ "error": "no department" }))),
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

fn doctor(email: &str, department: u32) -> EmployeeCreate {
    EmployeeCreate {
        first_name: "Anna".into(),
        last_name: "Nowak".into(),
        email: email.into(),
        role: StaffRole::Doctor {
            department: Some(DepartmentId(department)),
            specialization: None,
        },
    }
}

#[tokio::test]
async fn department_references_are_checked_over_http() {
    let mut config = FleetConfig::default();
    config.peers.insert("clinic".into(), spawn_clinic().await);
    let fleet = ClinicFleet::new(&config).unwrap();
    let admin = AuthContext::admin();

    // Known remotely; the local roster cannot be updated, which is logged and tolerated
    let id = fleet.staff.create(&admin, doctor("a@clinic.example", 1)).await.unwrap();
    let view = fleet.staff.find_view(&admin, id).await.unwrap();
    assert_eq!(view.department.map(|d| d.name), Some("Cardiology".to_string()));

    let err = fleet.staff.create(&admin, doctor("b@clinic.example", 2)).await.unwrap_err();
    assert_eq!(err, ServiceError::Validation("no department with id 2".into()));

    let err = fleet.staff.create(&admin, doctor("c@clinic.example", 3)).await.unwrap_err();
    assert!(
        matches!(err, ServiceError::RemoteUnavailable { ref dependency, .. } if dependency == "clinic"),
        "{err:?}"
    );

    fleet.shutdown().await.unwrap();
}
