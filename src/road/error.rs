/// Failures reported by road construction, fitting and geometry queries.
///
/// None of these abort an event: callers reject the pattern, void the road,
/// or skip the road pairing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RoadError {
    /// The pattern hits a plane already claimed by the road with a disjoint
    /// set of wires.
    PatternConflict { plane: u16 },
    /// Patterns can no longer be added once coordinates have been collected.
    Frozen,
    /// `fit` was called before `finish`.
    NotFinished,
    /// Too few planes carry position candidates to constrain a line.
    InsufficientPlanes { found: usize, minimum: usize },
    /// No point combination produced a fit with at least one degree of freedom.
    NoValidFit,
    /// Best-fit data was requested from a road without fits.
    NoFit,
    /// The two roads measure parallel coordinates; their lines do not define a point.
    ParallelProjections { angle_a: f64, angle_b: f64 },
}

impl std::fmt::Display for RoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoadError::PatternConflict { plane } => {
                write!(f, "pattern conflicts with road hits on plane {plane}")
            }
            RoadError::Frozen => write!(f, "road is finished; no more patterns can be added"),
            RoadError::NotFinished => write!(f, "road must be finished before fitting"),
            RoadError::InsufficientPlanes { found, minimum } => write!(
                f,
                "insufficient planes with candidates ({found} < {minimum})"
            ),
            RoadError::NoValidFit => write!(f, "no point combination yielded a valid fit"),
            RoadError::NoFit => write!(f, "road has no fit results"),
            RoadError::ParallelProjections { angle_a, angle_b } => write!(
                f,
                "projections are parallel ({:.2}° vs {:.2}°), intersection undefined",
                angle_a.to_degrees(),
                angle_b.to_degrees()
            ),
        }
    }
}

impl std::error::Error for RoadError {}
