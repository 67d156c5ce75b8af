use chrono::{Duration, Utc};
use clap::Parser;
use clinic_fleet::lifecycle::tracing::setup_tracing;
use clinic_fleet::lifecycle::{CliArgs, ClinicFleet, FleetConfig};
use clinic_fleet::model::{
    Address, ClientCreate, DepartmentCreate, DutyCreate, EmployeeCreate, FacilityCreate,
    PersonalData, RegistrationCreate, ResultCreate, StaffRole,
};
use fleet_framework::{AuthContext, Role, ServiceClient};
use tracing::{error, info, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let config = FleetConfig::from_args(CliArgs::parse()).map_err(|e| e.to_string())?;
    info!(
        channel_capacity = config.channel_capacity,
        remote_peers = config.peers.len(),
        "Starting clinic fleet"
    );

    let fleet = ClinicFleet::new(&config).map_err(|e| e.to_string())?;
    let admin = AuthContext::admin();

    let span = tracing::info_span!("clinic_setup");
    let (department_id, doctor_id, duty_id) = async {
        let facility_id = fleet
            .facilities
            .create(
                &admin,
                FacilityCreate {
                    name: "Central Clinic".to_string(),
                    address: Address {
                        city: "Gdansk".to_string(),
                        street: "Grunwaldzka".to_string(),
                        house_number: "12".to_string(),
                        postal_code: "80-200".to_string(),
                    },
                },
            )
            .await?;
        let department_id = fleet
            .departments
            .create(
                &admin,
                DepartmentCreate {
                    name: "Cardiology".to_string(),
                    facility: Some(facility_id),
                },
            )
            .await?;
        let doctor_id = fleet
            .staff
            .create(
                &admin,
                EmployeeCreate {
                    first_name: "Anna".to_string(),
                    last_name: "Nowak".to_string(),
                    email: "anna.nowak@clinic.example".to_string(),
                    role: StaffRole::Doctor {
                        department: Some(department_id),
                        specialization: Some("cardiology".to_string()),
                    },
                },
            )
            .await?;
        let duty_id = fleet
            .duties
            .create(
                &admin,
                DutyCreate {
                    name: "ECG".to_string(),
                    description: Some("Resting electrocardiogram".to_string()),
                    price: 120.0,
                },
            )
            .await?;
        Ok::<_, fleet_framework::ServiceError>((department_id, doctor_id, duty_id))
    }
    .instrument(span)
    .await
    .map_err(|e| e.to_string())?;

    info!(%department_id, %doctor_id, %duty_id, "Clinic set up");

    // Self sign-up
    let client_id = fleet
        .clients
        .create(
            &AuthContext::anonymous(),
            ClientCreate {
                email: "jan.kowalski@example.com".to_string(),
                password: "correct-horse".to_string(),
                personal_data: PersonalData {
                    first_name: "Jan".to_string(),
                    last_name: "Kowalski".to_string(),
                    phone: Some("+48 500 600 700".to_string()),
                    address: Some(Address {
                        city: "Sopot".to_string(),
                        street: "Monte Cassino".to_string(),
                        house_number: "5".to_string(),
                        postal_code: "81-701".to_string(),
                    }),
                },
            },
        )
        .await
        .map_err(|e| e.to_string())?;

    let span = tracing::info_span!("booking");
    let booking = async {
        let registration_id = fleet
            .registrations
            .create(
                &admin,
                RegistrationCreate {
                    duty: Some(duty_id),
                    doctor: Some(doctor_id),
                    client: Some(client_id),
                    start: Utc::now() + Duration::days(1),
                },
            )
            .await?;
        let doctor = AuthContext::new(doctor_id.0, Role::Doctor);
        let result_id = fleet
            .results
            .create(
                &doctor,
                ResultCreate {
                    description: "Normal sinus rhythm".to_string(),
                    recommendations: Some("Control in 12 months".to_string()),
                    registration: Some(registration_id),
                },
            )
            .await?;
        Ok::<_, fleet_framework::ServiceError>((registration_id, result_id))
    }
    .instrument(span)
    .await;

    match booking {
        Ok((registration_id, result_id)) => {
            let owner = AuthContext::new(client_id.0, Role::Client);
            match fleet.results.find_view(&owner, result_id).await {
                Ok(view) => info!(
                    %registration_id,
                    %result_id,
                    description = view.result.description.as_deref().unwrap_or("<withheld>"),
                    "Client reads their result"
                ),
                Err(e) => error!(error = %e, "Result view failed"),
            }

            // Withdrawing the duty detaches the booking instead of deleting it
            if let Err(e) = fleet.duties.delete(&admin, duty_id).await {
                error!(error = %e, "Duty withdrawal failed");
            }
            match fleet.registrations.find_view(&admin, registration_id).await {
                Ok(view) => info!(
                    %registration_id,
                    duty = ?view.registration.duty,
                    doctor = ?view.doctor.map(|d| d.full_name()),
                    "Registration after duty withdrawal"
                ),
                Err(e) => error!(error = %e, "Registration view failed"),
            }
        }
        Err(e) => error!(error = %e, status = e.status(), "Booking failed"),
    }

    fleet.shutdown().await?;

    info!("Clinic fleet stopped");
    Ok(())
}
