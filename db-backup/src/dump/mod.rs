//! Dump command construction.
//!
//! The command builder turns resolved connection parameters into a single
//! shell-invocable string that writes the dump to the producer's chosen file.
//! Running that string is left to [`producer::run_dump`].

pub mod producer;

use crate::connection::ConnectionParams;
use crate::utils::errors::{BackupError, Result};
use std::path::Path;

/// Socket substituted for MySQL connections that do not name one
pub const MYSQL_DEFAULT_SOCKET: &str = "/var/run/mysqld/mysqld.sock";

/// Supported database drivers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    /// `mysql` / `pdo_mysql`, dumped with `mysqldump`
    MySql,
    /// `mariadb`, dumped with `mariadb-dump`
    MariaDb,
}

impl Driver {
    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "mysql" | "pdo_mysql" => Ok(Driver::MySql),
            "mariadb" => Ok(Driver::MariaDb),
            other => Err(BackupError::UnsupportedDriver(other.to_string())),
        }
    }

    /// Name of the vendor dump executable
    pub fn tool(&self) -> &'static str {
        match self {
            Driver::MySql => "mysqldump",
            Driver::MariaDb => "mariadb-dump",
        }
    }

    /// Socket used when the connection does not specify one.
    ///
    /// MariaDB leaves the choice to the client, so no flag is emitted at all.
    fn default_socket(&self) -> Option<&'static str> {
        match self {
            Driver::MySql => Some(MYSQL_DEFAULT_SOCKET),
            Driver::MariaDb => None,
        }
    }

    /// Build the shell command that dumps `params` into `output`.
    pub fn build_dump_command(
        &self,
        params: &ConnectionParams,
        executable_prefix: Option<&Path>,
        output: &Path,
    ) -> Result<String> {
        let host = required(&params.host, "host")?;
        let user = required(&params.user, "user")?;
        let dbname = required(&params.dbname, "dbname")?;

        let executable = match executable_prefix {
            Some(prefix) => prefix.join(self.tool()).to_string_lossy().into_owned(),
            None => self.tool().to_string(),
        };

        let mut args = vec![executable, format!("--host={}", host)];
        if let Some(port) = params.port {
            args.push(format!("--port={}", port));
        }
        args.push(format!("--user={}", user));
        if let Some(password) = &params.password {
            args.push(format!("--password={}", password));
        }
        if let Some(socket) = params.socket.as_deref().or(self.default_socket()) {
            args.push(format!("--socket={}", socket));
        }
        args.push(dbname.to_string());

        let mut command = shell_words::join(&args);
        command.push_str(" > ");
        command.push_str(&shell_words::quote(&output.to_string_lossy()));

        Ok(command)
    }
}

/// Build the dump command for a connection, dispatching on its driver name.
pub fn build_dump_command(
    params: &ConnectionParams,
    executable_prefix: Option<&Path>,
    output: &Path,
) -> Result<String> {
    Driver::from_name(&params.driver)?.build_dump_command(params, executable_prefix, output)
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str> {
    value
        .as_deref()
        .ok_or_else(|| BackupError::InvalidParameters(format!("missing {}", name)))
}
