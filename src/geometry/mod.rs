pub mod curve;

pub use curve::{
    ArcLengthTable, CatmullRom, CircularArc, Curve, Kinematics, Parameterization,
};
