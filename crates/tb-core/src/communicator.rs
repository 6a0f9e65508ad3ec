//! Entry points for host integrations
//!
//! A [`Communicator`] pairs a [`Session`] with the mesh adapter so callers
//! only deal in host meshes. [`with_session`] scopes one to a closure.

use tb_protocol::PropertyBag;

use crate::adapter;
use crate::config::ClientConfig;
use crate::error::ToxicblendError;
use crate::operators::Operator;
use crate::session::Session;
use crate::types::HostMesh;

/// Name given to received objects when no command has been sent
const DEFAULT_OBJECT_NAME: &str = "toxicblend";

/// Host-facing side of a session
#[derive(Debug)]
pub struct Communicator {
    session: Session,
    last_command: Option<String>,
}

impl Communicator {
    /// Open a session to the server named in `config`
    pub fn connect(config: &ClientConfig) -> Result<Self, ToxicblendError> {
        config.validate()?;
        Ok(Self::from_session(Session::open(config)?))
    }

    /// Wrap an already open session
    pub fn from_session(session: Session) -> Self {
        Self {
            session,
            last_command: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Send `object` along with `command` and its properties
    pub fn send_single_object(
        &mut self,
        object: &HostMesh,
        command: &str,
        properties: &PropertyBag,
    ) -> Result<(), ToxicblendError> {
        let record = match adapter::to_record(object) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(object = %object.name, "Cannot send object: {}", e);
                self.session.close();
                return Err(e.into());
            }
        };
        self.session.send(command, properties, Some(&record))?;
        self.last_command = Some(command.to_string());
        Ok(())
    }

    /// Send `command` without geometry
    pub fn send_command_only(
        &mut self,
        command: &str,
        properties: &PropertyBag,
    ) -> Result<(), ToxicblendError> {
        self.session.send(command, properties, None)?;
        self.last_command = Some(command.to_string());
        Ok(())
    }

    /// Receive the response to the last request as host meshes.
    ///
    /// Objects are named after the command, e.g. `toxicblend_medianaxis.000`.
    pub fn receive_objects(&mut self) -> Result<Vec<HostMesh>, ToxicblendError> {
        let base = object_base_name(self.last_command.as_deref());
        let mut objects = Vec::new();
        self.session.receive_each(|record| {
            let name = format!("{}.{:03}", base, objects.len());
            objects.push(adapter::from_record(record, name));
        })?;
        Ok(objects)
    }

    /// Run `operator` once: validate, send, and receive.
    ///
    /// `object` is ignored by operators that do not need one.
    pub fn execute(
        &mut self,
        operator: &dyn Operator,
        object: Option<&HostMesh>,
    ) -> Result<Vec<HostMesh>, ToxicblendError> {
        let result = self.run_operator(operator, object);
        if result.is_err() {
            self.session.close();
        }
        result
    }

    fn run_operator(
        &mut self,
        operator: &dyn Operator,
        object: Option<&HostMesh>,
    ) -> Result<Vec<HostMesh>, ToxicblendError> {
        operator.validate()?;
        let properties = operator.properties();
        tracing::info!(command = operator.command(), "Running {}", operator.label());

        if operator.requires_object() {
            let object = object
                .ok_or_else(|| ToxicblendError::MissingObject(operator.command().to_string()))?;
            self.send_single_object(object, operator.command(), &properties)?;
        } else {
            self.send_command_only(operator.command(), &properties)?;
        }
        self.receive_objects()
    }

    /// Close the session now instead of on drop
    pub fn close(&mut self) {
        self.session.close();
    }
}

/// `object.toxicblend_medianaxis` -> `toxicblend_medianaxis`
fn object_base_name(command: Option<&str>) -> String {
    command
        .and_then(|c| c.rsplit('.').next())
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_OBJECT_NAME)
        .to_string()
}

/// Open a session, run `f` with it, and close it whatever `f` returns
pub fn with_session<T, F>(config: &ClientConfig, f: F) -> Result<T, ToxicblendError>
where
    F: FnOnce(&mut Communicator) -> Result<T, ToxicblendError>,
{
    let mut communicator = Communicator::connect(config)?;
    let result = f(&mut communicator);
    communicator.close();
    result
}
