//! Tests against the exported `ClinicCore` object.

use clinic_core::{
    open_clinic, open_clinic_in_memory, ClinicError, FfiPrescriptionOrder, FfiPrincipal,
    FfiSlotKey,
};

fn principal(id: &str, role: &str) -> FfiPrincipal {
    FfiPrincipal {
        id: id.to_string(),
        name: format!("{} user", role),
        role: role.to_string(),
    }
}

fn doctor() -> FfiPrincipal {
    principal("D001", "doctor")
}

fn patient() -> FfiPrincipal {
    principal("P1001", "patient")
}

fn pharmacist() -> FfiPrincipal {
    principal("PH001", "pharmacist")
}

fn admin() -> FfiPrincipal {
    principal("A001", "admin")
}

fn key(date: &str, time: &str) -> FfiSlotKey {
    FfiSlotKey {
        doctor_id: "D001".to_string(),
        date: date.to_string(),
        time: time.to_string(),
    }
}

#[test]
fn test_scenario_through_ffi() {
    let clinic = open_clinic_in_memory().unwrap();
    clinic
        .add_medicine(admin(), "Paracetamol".into(), 0.5, 100, 20)
        .unwrap();

    let slot = clinic
        .create_slot(doctor(), "25/12/24".into(), "14:30".into())
        .unwrap();
    assert_eq!(slot.status, "OPEN");
    assert_eq!(slot.date, "25/12/24");

    let booked = clinic
        .book(patient(), "D001".into(), "25/12/24".into(), "14:30".into())
        .unwrap();
    assert_eq!(booked.status, "PENDING");

    clinic.approve_request(doctor(), booked.appointment_id.clone()).unwrap();

    let receipt = clinic
        .record_outcome(
            doctor(),
            "25/12/24".into(),
            "14:30".into(),
            "Consultation".into(),
            "".into(),
            vec![
                FfiPrescriptionOrder {
                    medication: "Paracetamol".into(),
                    quantity: 2,
                },
                FfiPrescriptionOrder {
                    medication: "Asprin".into(),
                    quantity: 1,
                },
            ],
        )
        .unwrap();
    assert_eq!(receipt.appointment.status, "COMPLETED");
    assert_eq!(receipt.outcome.cost, 20.0);
    assert_eq!(receipt.prescriptions.len(), 1);
    assert_eq!(receipt.rejected.len(), 1);

    let pending = clinic.pending_prescriptions(pharmacist()).unwrap();
    let dispensed = clinic
        .dispense(pharmacist(), pending[0].prescription_id.clone())
        .unwrap();
    assert_eq!(dispensed.outcome_cost, 21.0);
    assert_eq!(dispensed.medicine.stock, 98);

    let outcomes = clinic.my_outcomes(patient()).unwrap();
    assert_eq!(outcomes[0].outcome.cost, 21.0);
    assert_eq!(outcomes[0].prescriptions[0].status, "dispensed");

    let csv = clinic.export_billing_csv(admin()).unwrap();
    assert_eq!(csv.lines().count(), 3);
}

#[test]
fn test_error_mapping() {
    let clinic = open_clinic_in_memory().unwrap();

    assert!(matches!(
        clinic.create_slot(patient(), "25/12/24".into(), "14:30".into()),
        Err(ClinicError::Forbidden(_))
    ));
    assert!(matches!(
        clinic.create_slot(doctor(), "25/12/2024".into(), "14:30".into()),
        Err(ClinicError::ValidationFailure(_))
    ));
    assert!(matches!(
        clinic.create_slot(principal("X1", "janitor"), "25/12/24".into(), "14:30".into()),
        Err(ClinicError::ValidationFailure(_))
    ));

    clinic
        .create_slot(doctor(), "25/12/24".into(), "14:30".into())
        .unwrap();
    assert!(matches!(
        clinic.create_slot(doctor(), "25/12/24".into(), "14:30".into()),
        Err(ClinicError::Conflict(_))
    ));
    assert!(matches!(
        clinic.book(patient(), "D001".into(), "25/12/24".into(), "15:00".into()),
        Err(ClinicError::NotFound(_))
    ));
}

#[test]
fn test_reschedule_through_ffi() {
    let clinic = open_clinic_in_memory().unwrap();
    clinic.create_slot(doctor(), "25/12/24".into(), "14:30".into()).unwrap();
    clinic.create_slot(doctor(), "25/12/24".into(), "15:00".into()).unwrap();
    clinic
        .book(patient(), "D001".into(), "25/12/24".into(), "14:30".into())
        .unwrap();

    let moved = clinic
        .reschedule(patient(), key("25/12/24", "14:30"), key("25/12/24", "15:00"))
        .unwrap();
    assert_eq!(moved.time, "15:00");

    let open = clinic.open_slots().unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].time, "14:30");
}

#[test]
fn test_replenishment_through_ffi() {
    let clinic = open_clinic_in_memory().unwrap();
    clinic
        .add_medicine(admin(), "Amoxicillin".into(), 2.0, 5, 10)
        .unwrap();

    let low = clinic.inventory(pharmacist()).unwrap();
    assert!(low[0].low_stock);

    let request = clinic
        .file_request(pharmacist(), "Amoxicillin".into(), 20)
        .unwrap();
    assert_eq!(request.status, "pending");
    assert_eq!(clinic.pending_replenishments(admin()).unwrap().len(), 1);

    let receipt = clinic
        .approve_replenishment(admin(), request.request_id)
        .unwrap();
    assert_eq!(receipt.medicine.stock, 25);
    assert!(!receipt.medicine.low_stock);
    assert_eq!(receipt.request.status, "approved");
}

#[test]
fn test_on_disk_clinic_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clinic.db").to_string_lossy().to_string();

    {
        let clinic = open_clinic(path.clone()).unwrap();
        clinic
            .create_slot(doctor(), "25/12/24".into(), "09:00".into())
            .unwrap();
    }

    let clinic = open_clinic(path).unwrap();
    let all = clinic.all_appointments(admin()).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].status, "OPEN");
}

#[test]
fn test_snapshot_json_round_trip() {
    let source = open_clinic_in_memory().unwrap();
    source
        .add_medicine(admin(), "Paracetamol".into(), 0.5, 100, 20)
        .unwrap();
    source
        .create_slot(doctor(), "25/12/24".into(), "09:00".into())
        .unwrap();
    let json = source.export_snapshot_json(admin()).unwrap();

    let target = open_clinic_in_memory().unwrap();
    assert!(matches!(
        target.import_snapshot_json(patient(), json.clone()),
        Err(ClinicError::Forbidden(_))
    ));
    target.import_snapshot_json(admin(), json).unwrap();

    assert_eq!(target.all_appointments(admin()).unwrap().len(), 1);
    assert_eq!(target.inventory(admin()).unwrap().len(), 1);
}

#[test]
fn test_replenishment_overflow_keeps_clinic_usable() {
    let clinic = open_clinic_in_memory().unwrap();
    clinic
        .add_medicine(admin(), "Amoxicillin".into(), 2.0, 5, 10)
        .unwrap();
    let request = clinic
        .file_request(pharmacist(), "Amoxicillin".into(), i64::MAX)
        .unwrap();

    assert!(matches!(
        clinic.approve_replenishment(admin(), request.request_id),
        Err(ClinicError::ValidationFailure(_))
    ));

    let stock = clinic.inventory(admin()).unwrap();
    assert_eq!(stock[0].stock, 5);
    assert_eq!(clinic.pending_replenishments(admin()).unwrap().len(), 1);
}

#[test]
fn test_outcome_and_statement_by_appointment() {
    let clinic = open_clinic_in_memory().unwrap();
    clinic
        .add_medicine(admin(), "Paracetamol".into(), 0.5, 100, 20)
        .unwrap();
    clinic
        .create_slot(doctor(), "25/12/24".into(), "09:00".into())
        .unwrap();
    let booked = clinic
        .book(patient(), "D001".into(), "25/12/24".into(), "09:00".into())
        .unwrap();
    clinic.approve_request(doctor(), booked.appointment_id.clone()).unwrap();

    let receipt = clinic
        .record_outcome_by_id(
            doctor(),
            booked.appointment_id.clone(),
            "Consultation".into(),
            "".into(),
            vec![FfiPrescriptionOrder {
                medication: "Paracetamol".into(),
                quantity: 4,
            }],
        )
        .unwrap();
    clinic
        .dispense(pharmacist(), receipt.prescriptions[0].prescription_id.clone())
        .unwrap();

    let outcome = clinic
        .outcome_for(patient(), booked.appointment_id.clone())
        .unwrap();
    assert_eq!(outcome.outcome.cost, 22.0);
    assert!(matches!(
        clinic.outcome_for(principal("P2002", "patient"), booked.appointment_id.clone()),
        Err(ClinicError::Forbidden(_))
    ));

    let csv = clinic
        .billing_statement_csv(patient(), booked.appointment_id.clone())
        .unwrap();
    assert_eq!(csv.lines().count(), 3);
    let json = clinic
        .billing_statement_json(admin(), booked.appointment_id.clone())
        .unwrap();
    assert!(json.contains("Consultation fee"));
    assert_eq!(clinic.my_billing_csv(patient()).unwrap(), csv);
    assert!(matches!(
        clinic.billing_statement_csv(pharmacist(), booked.appointment_id),
        Err(ClinicError::Forbidden(_))
    ));
}

#[test]
fn test_dates_must_be_zero_padded() {
    let clinic = open_clinic_in_memory().unwrap();
    assert!(matches!(
        clinic.create_slot(doctor(), "5/1/24".into(), "09:00".into()),
        Err(ClinicError::ValidationFailure(_))
    ));
    let slot = clinic
        .create_slot(doctor(), "25/12/99".into(), "09:00".into())
        .unwrap();
    assert_eq!(slot.date, "25/12/99");
}
