//! FANUC register access over EtherNet/IP.
//!
//! FANUC robot controllers expose their registers as ordinary symbolic
//! tags: `R[1]`, `PR[3]`, `DI[7]`, and so on, with position-register
//! components addressed as `PR[3].X` through `PR[3].R`, `PR[3].Config`,
//! and the extension axes `PR[3].E1`..`PR[3].E3`. This module maps typed
//! register indices onto those tag names and the matching CIP data types,
//! then drives the ordinary typed tag client.

use tracing::debug;

use crate::codec::{CipType, PlcValue};
use crate::config::ClientConfig;
use crate::error::{EipError, Result};
use crate::plc::PlcClient;

/// FANUC register families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterType {
    /// Numeric registers.
    R,
    /// Position registers.
    Pr,
    /// Digital inputs.
    Di,
    /// Digital outputs.
    Do,
    /// Analog inputs.
    Ai,
    /// Analog outputs.
    Ao,
    /// Group inputs.
    Gi,
    /// Group outputs.
    Go,
    /// User frame registers.
    Ur,
    /// String registers.
    Sr,
    /// Vision registers.
    Vr,
}

impl RegisterType {
    fn prefix(self) -> &'static str {
        match self {
            RegisterType::R => "R",
            RegisterType::Pr => "PR",
            RegisterType::Di => "DI",
            RegisterType::Do => "DO",
            RegisterType::Ai => "AI",
            RegisterType::Ao => "AO",
            RegisterType::Gi => "GI",
            RegisterType::Go => "GO",
            RegisterType::Ur => "UR",
            RegisterType::Sr => "SR",
            RegisterType::Vr => "VR",
        }
    }

    /// The symbolic tag name for this register, e.g. `R[5]`.
    pub fn tag_name(self, index: u32) -> String {
        format!("{}[{}]", self.prefix(), index)
    }

    /// The CIP data type this register family reads and writes as.
    ///
    /// User-frame, string, and vision registers are addressed as STRING.
    /// Position registers are structured and nominally STRING, but the
    /// client reads and writes them component-wise through the
    /// position-register calls rather than as one tag.
    pub fn data_type(self) -> CipType {
        match self {
            RegisterType::R | RegisterType::Ai | RegisterType::Ao => CipType::Real,
            RegisterType::Di | RegisterType::Do | RegisterType::Gi | RegisterType::Go => {
                CipType::Bool
            }
            RegisterType::Pr | RegisterType::Ur | RegisterType::Sr | RegisterType::Vr => {
                CipType::String
            }
        }
    }
}

/// A Cartesian position as stored in a FANUC position register.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Position {
    /// X coordinate, millimeters.
    pub x: f32,
    /// Y coordinate, millimeters.
    pub y: f32,
    /// Z coordinate, millimeters.
    pub z: f32,
    /// Wrist yaw, degrees.
    pub w: f32,
    /// Wrist pitch, degrees.
    pub p: f32,
    /// Wrist roll, degrees.
    pub r: f32,
    /// Robot configuration string.
    pub config: String,
    /// Extension axes, when the controller has them.
    pub extensions: Vec<f32>,
}

/// A register's value: scalar families carry a [`PlcValue`], position
/// registers a [`Position`].
#[derive(Debug, Clone, PartialEq)]
pub enum RegisterValue {
    /// Value of a numeric, digital, group, analog, or string register.
    Scalar(PlcValue),
    /// Value of a position register.
    Position(Position),
}

/// A FANUC-flavored client: register names in, typed values out.
pub struct FanucClient {
    plc: PlcClient,
}

impl FanucClient {
    /// Connects to a controller and registers a session.
    pub async fn connect(addr: &str) -> Result<Self> {
        Self::connect_with_config(addr, ClientConfig::default()).await
    }

    /// Connects with an explicit configuration.
    pub async fn connect_with_config(addr: &str, config: ClientConfig) -> Result<Self> {
        let plc = PlcClient::connect_with_config(addr, config).await?;
        Ok(Self { plc })
    }

    /// Wraps an existing typed client.
    pub fn new(plc: PlcClient) -> Self {
        Self { plc }
    }

    /// Reads a register of any family.
    ///
    /// Scalar families come back as [`RegisterValue::Scalar`]. Position
    /// registers redirect to
    /// [`read_position_register`](Self::read_position_register) and come
    /// back as [`RegisterValue::Position`].
    pub async fn read_register(&self, reg: RegisterType, index: u32) -> Result<RegisterValue> {
        if reg == RegisterType::Pr {
            return self
                .read_position_register(index)
                .await
                .map(RegisterValue::Position);
        }
        self.plc
            .read_tag(&reg.tag_name(index), reg.data_type())
            .await
            .map(RegisterValue::Scalar)
    }

    /// Writes a register of any family.
    ///
    /// Position registers take a [`RegisterValue::Position`] and redirect
    /// to [`write_position_register`](Self::write_position_register); every
    /// other family takes a [`RegisterValue::Scalar`]. A mismatched pairing
    /// is an [`EipError::Precondition`] raised before any I/O.
    pub async fn write_register(
        &self,
        reg: RegisterType,
        index: u32,
        value: &RegisterValue,
    ) -> Result<()> {
        match (reg, value) {
            (RegisterType::Pr, RegisterValue::Position(position)) => {
                self.write_position_register(index, position).await
            }
            (RegisterType::Pr, RegisterValue::Scalar(_)) => Err(EipError::precondition(
                "position registers take a Position value",
            )),
            (_, RegisterValue::Position(_)) => Err(EipError::precondition(format!(
                "{} is not a position register",
                reg.tag_name(index)
            ))),
            (_, RegisterValue::Scalar(scalar)) => {
                self.plc
                    .write_tag(&reg.tag_name(index), reg.data_type(), scalar)
                    .await
            }
        }
    }

    /// Reads a position register component by component.
    ///
    /// Extension axes are controller-dependent: `E1`..`E3` are tried in
    /// order and reading stops quietly at the first one that fails.
    pub async fn read_position_register(&self, index: u32) -> Result<Position> {
        let mut position = Position {
            x: self.read_pr_component(index, "X").await?,
            y: self.read_pr_component(index, "Y").await?,
            z: self.read_pr_component(index, "Z").await?,
            w: self.read_pr_component(index, "W").await?,
            p: self.read_pr_component(index, "P").await?,
            r: self.read_pr_component(index, "R").await?,
            ..Position::default()
        };

        let config_tag = format!("PR[{}].Config", index);
        position.config = match self.plc.read_tag(&config_tag, CipType::String).await? {
            PlcValue::String(s) => s,
            other => {
                return Err(EipError::parse(format!(
                    "{} decoded as {:?} instead of a string",
                    config_tag, other
                )))
            }
        };

        for axis in 1..=3u32 {
            let tag = format!("PR[{}].E{}", index, axis);
            match self.plc.read_tag(&tag, CipType::Real).await {
                Ok(PlcValue::Real(v)) => position.extensions.push(v),
                Ok(_) | Err(_) => break,
            }
        }

        debug!(index, ?position, "read position register");
        Ok(position)
    }

    /// Writes a position register component by component.
    ///
    /// At most three extension axes are written; further entries in
    /// `position.extensions` are ignored.
    pub async fn write_position_register(&self, index: u32, position: &Position) -> Result<()> {
        self.write_pr_component(index, "X", position.x).await?;
        self.write_pr_component(index, "Y", position.y).await?;
        self.write_pr_component(index, "Z", position.z).await?;
        self.write_pr_component(index, "W", position.w).await?;
        self.write_pr_component(index, "P", position.p).await?;
        self.write_pr_component(index, "R", position.r).await?;

        self.plc
            .write_tag(
                &format!("PR[{}].Config", index),
                CipType::String,
                &PlcValue::String(position.config.clone()),
            )
            .await?;

        for (i, ext) in position.extensions.iter().take(3).enumerate() {
            self.write_pr_component(index, &format!("E{}", i + 1), *ext)
                .await?;
        }
        Ok(())
    }

    /// Reads `R[index]`.
    pub async fn read_r(&self, index: u32) -> Result<f32> {
        match self.read_register(RegisterType::R, index).await? {
            RegisterValue::Scalar(PlcValue::Real(v)) => Ok(v),
            other => Err(EipError::parse(format!(
                "R[{}] decoded as {:?} instead of REAL",
                index, other
            ))),
        }
    }

    /// Writes `R[index]`.
    pub async fn write_r(&self, index: u32, value: f32) -> Result<()> {
        self.write_register(
            RegisterType::R,
            index,
            &RegisterValue::Scalar(PlcValue::Real(value)),
        )
        .await
    }

    /// Reads `DI[index]`.
    pub async fn read_di(&self, index: u32) -> Result<bool> {
        match self.read_register(RegisterType::Di, index).await? {
            RegisterValue::Scalar(PlcValue::Bool(v)) => Ok(v),
            other => Err(EipError::parse(format!(
                "DI[{}] decoded as {:?} instead of BOOL",
                index, other
            ))),
        }
    }

    /// Writes `DO[index]`.
    pub async fn write_do(&self, index: u32, value: bool) -> Result<()> {
        self.write_register(
            RegisterType::Do,
            index,
            &RegisterValue::Scalar(PlcValue::Bool(value)),
        )
        .await
    }

    /// Tears down the session and the connection.
    pub async fn close(&self) -> Result<()> {
        self.plc.close().await
    }

    async fn read_pr_component(&self, index: u32, component: &str) -> Result<f32> {
        let tag = format!("PR[{}].{}", index, component);
        match self.plc.read_tag(&tag, CipType::Real).await? {
            PlcValue::Real(v) => Ok(v),
            other => Err(EipError::parse(format!(
                "{} decoded as {:?} instead of REAL",
                tag, other
            ))),
        }
    }

    async fn write_pr_component(&self, index: u32, component: &str, value: f32) -> Result<()> {
        self.plc
            .write_tag(
                &format!("PR[{}].{}", index, component),
                CipType::Real,
                &PlcValue::Real(value),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_names_use_bracket_indexing() {
        let cases = [
            (RegisterType::R, 1, "R[1]"),
            (RegisterType::Pr, 3, "PR[3]"),
            (RegisterType::Di, 101, "DI[101]"),
            (RegisterType::Do, 7, "DO[7]"),
            (RegisterType::Ai, 2, "AI[2]"),
            (RegisterType::Ao, 2, "AO[2]"),
            (RegisterType::Gi, 4, "GI[4]"),
            (RegisterType::Go, 4, "GO[4]"),
            (RegisterType::Ur, 9, "UR[9]"),
            (RegisterType::Sr, 5, "SR[5]"),
            (RegisterType::Vr, 6, "VR[6]"),
        ];
        for (reg, index, expected) in cases {
            assert_eq!(reg.tag_name(index), expected);
        }
    }

    #[test]
    fn register_families_map_to_cip_types() {
        assert_eq!(RegisterType::R.data_type(), CipType::Real);
        assert_eq!(RegisterType::Ai.data_type(), CipType::Real);
        assert_eq!(RegisterType::Ao.data_type(), CipType::Real);
        assert_eq!(RegisterType::Di.data_type(), CipType::Bool);
        assert_eq!(RegisterType::Do.data_type(), CipType::Bool);
        assert_eq!(RegisterType::Gi.data_type(), CipType::Bool);
        assert_eq!(RegisterType::Go.data_type(), CipType::Bool);
        assert_eq!(RegisterType::Pr.data_type(), CipType::String);
        assert_eq!(RegisterType::Ur.data_type(), CipType::String);
        assert_eq!(RegisterType::Sr.data_type(), CipType::String);
        assert_eq!(RegisterType::Vr.data_type(), CipType::String);
    }
}
