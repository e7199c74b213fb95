//! Robot status.

use std::fmt;

use fleet_core::Rgb;

/// The state a robot is in.  Exhaustively matched everywhere.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RobotStatus {
    #[default]
    Idle,
    Moving,
    /// Parked at its vertex until the coordinator resumes it.
    Waiting,
    Charging,
    TaskComplete,
}

impl RobotStatus {
    pub const ALL: [RobotStatus; 5] = [
        RobotStatus::Idle,
        RobotStatus::Moving,
        RobotStatus::Waiting,
        RobotStatus::Charging,
        RobotStatus::TaskComplete,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RobotStatus::Idle         => "idle",
            RobotStatus::Moving       => "moving",
            RobotStatus::Waiting      => "waiting",
            RobotStatus::Charging     => "charging",
            RobotStatus::TaskComplete => "task_complete",
        }
    }

    /// Display colour used by front-ends to tint a robot by status.
    pub fn color(self) -> Rgb {
        match self {
            RobotStatus::Idle         => Rgb(100, 100, 100),
            RobotStatus::Moving       => Rgb(0, 200, 0),
            RobotStatus::Waiting      => Rgb(255, 165, 0),
            RobotStatus::Charging     => Rgb(0, 0, 255),
            RobotStatus::TaskComplete => Rgb(128, 0, 128),
        }
    }

    /// Robots in these states hold no lane and need no reservation.
    #[inline]
    pub fn releases_lanes(self) -> bool {
        matches!(self, RobotStatus::Idle | RobotStatus::TaskComplete | RobotStatus::Charging)
    }
}

impl fmt::Display for RobotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
