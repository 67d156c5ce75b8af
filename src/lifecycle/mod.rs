//! Fleet lifecycle: configuration, tracing and the wiring of every service.

pub mod config;
pub mod tracing;

pub use config::{CliArgs, ConfigError, FleetConfig};

use crate::client_actor::{self, ClientContext};
use crate::clients::{
    ClientServiceClient, DepartmentClient, DutyClient, EmployeePeers, FacilityClient,
    RegistrationClient, RegistrationPeers, ResultClient, StaffClient,
};
use crate::clinic_actor::{self, DepartmentContext, FacilityContext};
use crate::duty_actor::{self, DutyContext};
use crate::registration_actor::{self, RegistrationContext};
use crate::result_actor::{self, ResultContext};
use crate::staff_actor::{self, StaffContext};
use ::tracing::{error, info};
use fleet_framework::{
    GateRegistry, HttpPeer, IndexLink, OwnedEntity, PeerLookup, RemoteResolver, ResourceClient,
    ServiceClient,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// The running fleet: one actor per owned store, one typed client per store.
///
/// Every actor is created before any is started, so each service context can hold clients of
/// its peers regardless of the direction of their references.
///
/// ```ignore
/// let fleet = ClinicFleet::new(&FleetConfig::default())?;
/// let duty = fleet.duties.create(&admin, DutyCreate { .. }).await?;
/// fleet.shutdown().await?;
/// ```
pub struct ClinicFleet {
    pub clients: ClientServiceClient,
    pub staff: StaffClient,
    pub departments: DepartmentClient,
    pub facilities: FacilityClient,
    pub duties: DutyClient,
    pub registrations: RegistrationClient,
    pub results: ResultClient,
    handles: Vec<JoinHandle<()>>,
}

/// Gated resolver for `resource` of `service`: over HTTP when the service has a configured
/// base URL, otherwise straight to the in-process actor.
fn resolver<T>(
    gates: &GateRegistry,
    service: &str,
    resource: &str,
    local: &ResourceClient<T>,
    config: &FleetConfig,
) -> RemoteResolver<T::Id, T>
where
    T: OwnedEntity + DeserializeOwned,
    T::Id: 'static,
{
    let peer: Arc<dyn PeerLookup<T::Id, T>> = match config.peers.get(service) {
        Some(base_url) => Arc::new(HttpPeer::<T>::new(base_url.clone(), resource)),
        None => Arc::new(local.clone()),
    };
    RemoteResolver::new(service, peer, gates.gate(service))
}

fn registry(service: &str, config: &FleetConfig) -> Result<GateRegistry, ConfigError> {
    GateRegistry::new(service, config.gate.clone()).map_err(ConfigError::Invalid)
}

impl ClinicFleet {
    /// Creates every actor, wires the contexts and spawns one task per actor.
    pub fn new(config: &FleetConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let capacity = config.channel_capacity;

        // 1. One breaker registry per calling service
        let client_gates = registry("client", config)?;
        let staff_gates = registry("staff", config)?;
        let clinic_gates = registry("clinic", config)?;
        let duty_gates = registry("duty", config)?;
        let registration_gates = registry("registration", config)?;
        let result_gates = registry("result", config)?;

        // 2. Create actors; nothing runs yet
        let (client_actor, client_inner) = client_actor::new(capacity);
        let (staff_actor, staff_inner) = staff_actor::new(capacity);
        let (department_actor, department_inner) = clinic_actor::departments(capacity);
        let (facility_actor, facility_inner) = clinic_actor::facilities(capacity);
        let (duty_actor, duty_inner) = duty_actor::new(capacity);
        let (registration_actor, registration_inner) = registration_actor::new(capacity);
        let (result_actor, result_inner) = result_actor::new(capacity);

        // 3. Contexts
        let client_ctx = ClientContext::new(
            registration_inner.clone(),
            client_gates.gate("registration"),
        );
        let staff_ctx = StaffContext::new(
            resolver(&staff_gates, "clinic", "departments", &department_inner, config),
            IndexLink::new("department", department_inner.clone(), staff_gates.gate("clinic")),
            registration_inner.clone(),
            staff_gates.gate("registration"),
        );
        let department_ctx = DepartmentContext::new(
            resolver(&clinic_gates, "facility", "facilities", &facility_inner, config),
            IndexLink::new("facility", facility_inner.clone(), clinic_gates.gate("facility")),
            staff_inner.clone(),
            clinic_gates.gate("staff"),
        );
        let facility_ctx = FacilityContext::new(department_inner.clone(), clinic_gates.gate("department"));
        let duty_ctx = DutyContext::new(registration_inner.clone(), duty_gates.gate("registration"));
        let registration_peers = RegistrationPeers {
            duties: resolver(&registration_gates, "duty", "duties", &duty_inner, config),
            doctors: resolver(&registration_gates, "staff", "employees", &staff_inner, config),
            clients: resolver(&registration_gates, "client", "clients", &client_inner, config),
        };
        let registration_ctx = RegistrationContext::new(
            registration_peers.duties.clone(),
            registration_peers.doctors.clone(),
            registration_peers.clients.clone(),
            result_inner.clone(),
            registration_gates.gate("result"),
        );
        let registrations_for_results = resolver(
            &result_gates,
            "registration",
            "registrations",
            &registration_inner,
            config,
        );
        let result_ctx = ResultContext::new(registrations_for_results.clone());

        // 4. Start
        let handles = vec![
            tokio::spawn(client_actor.run(client_ctx)),
            tokio::spawn(staff_actor.run(staff_ctx)),
            tokio::spawn(department_actor.run(department_ctx)),
            tokio::spawn(facility_actor.run(facility_ctx)),
            tokio::spawn(duty_actor.run(duty_ctx)),
            tokio::spawn(registration_actor.run(registration_ctx)),
            tokio::spawn(result_actor.run(result_ctx)),
        ];

        // 5. Typed clients; read-side resolvers share the breakers of the owning service
        let staff_peers = EmployeePeers {
            departments: resolver(&staff_gates, "clinic", "departments", &department_inner, config),
            staff: resolver(&staff_gates, "staff", "employees", &staff_inner, config),
        };
        let fleet = Self {
            clients: ClientServiceClient::new(client_inner),
            staff: StaffClient::new(staff_inner, staff_peers),
            departments: DepartmentClient::new(
                department_inner,
                resolver(&clinic_gates, "facility", "facilities", &facility_inner, config),
            ),
            facilities: FacilityClient::new(facility_inner),
            duties: DutyClient::new(duty_inner),
            registrations: RegistrationClient::new(registration_inner, registration_peers),
            results: ResultClient::new(result_inner, registrations_for_results),
            handles,
        };
        info!(actors = fleet.handles.len(), "Fleet started");
        Ok(fleet)
    }

    /// Stops every actor and waits for their tasks.
    ///
    /// Contexts hold clients of each other, so dropping clients would never close the
    /// channels; each actor is told to stop explicitly. An actor that is already gone is
    /// skipped.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down fleet...");
        let _ = self.clients.inner().shutdown().await;
        let _ = self.staff.inner().shutdown().await;
        let _ = self.departments.inner().shutdown().await;
        let _ = self.facilities.inner().shutdown().await;
        let _ = self.duties.inner().shutdown().await;
        let _ = self.registrations.inner().shutdown().await;
        let _ = self.results.inner().shutdown().await;

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(format!("Actor task failed: {:?}", e));
            }
        }

        info!("Fleet shutdown complete.");
        Ok(())
    }
}
