use std::sync::Arc;

use shipment_core::audit::{AuditEmitter, AuditEventKind, AuditTrail};
use shipment_core::{
    Ctx, ErrorKind, InMemoryCredentialStore, InMemoryShipmentRepository,
    JsonFileShipmentRepository, Principal, PrincipalId, Secret, ShipmentId, ShipmentInput,
    ShipmentRepository, ShipmentService, ShipmentStatus, Tainted,
};

fn input() -> ShipmentInput {
    ShipmentInput {
        pickup_address: Some("King Fahd Rd, Riyadh".into()),
        pickup_latitude: Some(24.7136.into()),
        pickup_longitude: Some(46.6753.into()),
        dropoff_address: Some("Corniche Rd, Jeddah".into()),
        dropoff_latitude: Some(21.5433.into()),
        dropoff_longitude: Some(39.1728.into()),
        cargo_type: Some("General".into()),
        weight: Some("1000-5000 kg".into()),
        truck_type: Some("Flatbed".into()),
    }
}

fn standard(id: u64) -> Ctx {
    Ctx::new(format!("req-std-{}", id))
        .authenticate(Some(Principal::standard(PrincipalId::new(id), "Customer")))
        .unwrap()
}

fn admin(id: u64) -> Ctx {
    Ctx::new(format!("req-adm-{}", id))
        .authenticate(Some(Principal::admin(PrincipalId::new(id), "Dispatcher")))
        .unwrap()
}

fn status(s: &str) -> Tainted<String> {
    Tainted::new(s.to_string())
}

fn service() -> ShipmentService {
    ShipmentService::new(
        Arc::new(InMemoryShipmentRepository::new()),
        Arc::new(InMemoryCredentialStore::new()),
    )
}

#[test]
fn own_list_contains_exactly_the_created_shipment() {
    let service = service();
    let a = standard(1);
    let b = standard(2);

    let created = service.create_shipment(&a, Tainted::new(input())).unwrap();

    let listed = service.list_own_shipments(&a).unwrap();
    assert_eq!(listed, vec![created.clone()]);

    let others = service.list_own_shipments(&b).unwrap();
    assert!(others.iter().all(|s| s.id() != created.id()));
}

#[test]
fn admin_moves_pending_straight_to_delivered() {
    let service = service();
    let created = service.create_shipment(&standard(1), Tainted::new(input())).unwrap();

    service
        .update_status(&admin(9), created.id(), status("delivered"))
        .unwrap();

    let fetched = service.get_shipment(&standard(1), created.id()).unwrap();
    assert_eq!(fetched.shipment.status(), ShipmentStatus::Delivered);
}

#[test]
fn standard_principal_cannot_change_status() {
    let service = service();
    let owner = standard(1);
    let created = service.create_shipment(&owner, Tainted::new(input())).unwrap();

    let err = service
        .update_status(&owner, created.id(), status("in_progress"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let fetched = service.get_shipment(&owner, created.id()).unwrap();
    assert_eq!(fetched.shipment.status(), ShipmentStatus::Pending);
}

#[test]
fn same_status_twice_is_idempotent() {
    let service = service();
    let created = service.create_shipment(&standard(1), Tainted::new(input())).unwrap();
    let root = admin(9);

    let first = service
        .update_status(&root, created.id(), status("in_progress"))
        .unwrap();
    let second = service
        .update_status(&root, created.id(), status("in_progress"))
        .unwrap();

    assert_eq!(first.status(), second.status());
    assert_eq!(first.id(), second.id());
    assert_eq!(first.owner_id(), second.owner_id());
    assert_eq!(first.created_at(), second.created_at());
}

#[test]
fn missing_pickup_address_writes_nothing() {
    let repository = Arc::new(InMemoryShipmentRepository::new());
    let service = ShipmentService::new(repository.clone(), Arc::new(InMemoryCredentialStore::new()));

    let mut incomplete = input();
    incomplete.pickup_address = None;

    let err = service
        .create_shipment(&standard(1), Tainted::new(incomplete))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(repository.find_all().unwrap().is_empty());
}

#[test]
fn owner_id_never_changes() {
    let service = service();
    let created = service.create_shipment(&standard(3), Tainted::new(input())).unwrap();

    for next in ["in_progress", "delivered", "pending"] {
        let updated = service
            .update_status(&admin(9), created.id(), status(next))
            .unwrap();
        assert_eq!(updated.owner_id(), PrincipalId::new(3));
    }
}

#[test]
fn non_owner_gets_forbidden_not_the_record() {
    let service = service();
    let created = service.create_shipment(&standard(1), Tainted::new(input())).unwrap();

    let err = service.get_shipment(&standard(2), created.id()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert_eq!(err.to_string(), "Policy violation: Forbidden");
}

#[test]
fn out_of_set_status_is_invalid_for_every_role() {
    let service = service();
    let created = service.create_shipment(&standard(1), Tainted::new(input())).unwrap();

    for ctx in [standard(1), standard(2), admin(9)] {
        for bad in ["cancelled", "DELIVERED", " pending", ""] {
            let err = service
                .update_status(&ctx, created.id(), status(bad))
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidStatus, "{:?}", bad);
        }
    }
}

#[test]
fn audit_trail_records_lifecycle() {
    let trail = Arc::new(AuditTrail::new());
    let service = service().with_audit(AuditEmitter::default().with_trail(Arc::clone(&trail)));

    let created = service.create_shipment(&standard(1), Tainted::new(input())).unwrap();
    let _ = service.list_all_shipments(&standard(1));
    service
        .update_status(&admin(9), created.id(), status("delivered"))
        .unwrap();

    let kinds: Vec<_> = trail.events().iter().map(|e| e.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            AuditEventKind::ShipmentCreated,
            AuditEventKind::AccessDenied,
            AuditEventKind::StatusChanged,
        ]
    );
}

#[test]
fn json_repository_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shipments.json");
    let directory = Arc::new(InMemoryCredentialStore::new());

    let id = {
        let repository = Arc::new(JsonFileShipmentRepository::open(&path).unwrap());
        let service = ShipmentService::new(repository, directory.clone());
        let created = service.create_shipment(&standard(1), Tainted::new(input())).unwrap();
        service
            .update_status(&admin(9), created.id(), status("in_progress"))
            .unwrap();
        created.id()
    };

    let repository = Arc::new(JsonFileShipmentRepository::open(&path).unwrap());
    let service = ShipmentService::new(repository, directory);
    let fetched = service.get_shipment(&standard(1), id).unwrap();

    assert_eq!(fetched.shipment.status(), ShipmentStatus::InProgress);
    assert_eq!(fetched.shipment.pickup().address, "King Fahd Rd, Riyadh");
    assert!(service.get_shipment(&standard(1), ShipmentId::new(2)).is_err());
}

#[test]
fn concurrent_creates_get_distinct_ids() {
    let service = Arc::new(service());

    let handles: Vec<_> = (1..=8)
        .map(|owner| {
            let service = Arc::clone(&service);
            std::thread::spawn(move || {
                service
                    .create_shipment(&standard(owner), Tainted::new(input()))
                    .unwrap()
                    .id()
            })
        })
        .collect();

    let mut ids: Vec<u64> = handles
        .into_iter()
        .map(|h| h.join().unwrap().get())
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, (1..=8).collect::<Vec<_>>());
}

#[test]
fn secrets_stay_redacted() {
    let token = Secret::new("7|0123456789abcdef".to_string());
    assert_eq!(format!("{:?}", token), "[REDACTED]");
    assert_eq!(format!("{}", token), "[REDACTED]");
}
