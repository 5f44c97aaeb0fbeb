//! Helical and globoid centerline paths.

use serde::{Deserialize, Serialize};
use wormcad_math::{Point3, Vec3};

use crate::spec::ThreadSpec;
use crate::ProfileError;

/// Position and tangent at a path parameter `t ∈ [0, 1]`.
#[derive(Debug, Clone, Copy)]
pub struct PathPoint {
    /// Position on the path.
    pub position: Point3,
    /// Unit tangent direction (direction of thread advance).
    pub tangent: Vec3,
    /// Normalized path parameter.
    pub t: f64,
}

/// Globoid throat configuration.
///
/// The throat formulas follow the manufacturing standard stated by the
/// source material and are reproduced as given, not re-derived.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GloboidThroat {
    /// Centre distance between worm and wheel axes.
    pub centre_distance: f64,
    /// Pitch radius of the mating wheel (curvature of the waist).
    pub wheel_pitch_radius: f64,
    /// Additional radial reduction applied at the throat.
    pub throat_reduction: f64,
}

impl GloboidThroat {
    /// Pitch radius at the narrowest point of the hourglass.
    pub fn throat_pitch_radius(&self) -> f64 {
        self.centre_distance - self.wheel_pitch_radius - self.throat_reduction
    }

    fn validate(&self) -> Result<(), ProfileError> {
        let radius = self.throat_pitch_radius();
        if radius <= 0.0 {
            return Err(ProfileError::InvalidThroat {
                radius,
                centre_distance: self.centre_distance,
                wheel_pitch_radius: self.wheel_pitch_radius,
                throat_reduction: self.throat_reduction,
            });
        }
        Ok(())
    }
}

/// Worm body form: constant-radius helix or hourglass.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub enum WormForm {
    /// Constant pitch radius along the whole length.
    #[default]
    Cylindrical,
    /// Variable pitch radius, narrowest at the centre.
    Globoid(GloboidThroat),
}

/// Extended path length: one full lead beyond the nominal length on each
/// end, so the end-taper zones exist to be trimmed off later.
pub fn extended_length(nominal_length: f64, lead: f64) -> f64 {
    nominal_length + 2.0 * lead
}

/// Samples the 3D centerline path one thread is lofted along.
///
/// Deterministic for identical inputs; each call produces a fresh,
/// finite sequence. Multi-start worms call [`HelixPathGenerator::sample`]
/// once per start with `start_angle_deg = k * 360 / starts`.
#[derive(Debug, Clone)]
pub struct HelixPathGenerator {
    spec: ThreadSpec,
    form: WormForm,
}

impl HelixPathGenerator {
    /// Create a generator for the given thread and worm form.
    pub fn new(spec: &ThreadSpec, form: WormForm) -> Self {
        Self {
            spec: spec.clone(),
            form,
        }
    }

    /// Sample `samples` path points over `total_length`, centered on the
    /// origin (`z ∈ [-L/2, +L/2]`), starting at `start_angle_deg`.
    ///
    /// Fails with [`ProfileError::InvalidThroat`] before producing any
    /// geometry if a globoid configuration is impossible.
    pub fn sample(
        &self,
        start_angle_deg: f64,
        total_length: f64,
        samples: usize,
    ) -> Result<Vec<PathPoint>, ProfileError> {
        if total_length <= 0.0 {
            return Err(ProfileError::InvalidLength(total_length));
        }
        if self.spec.lead <= 0.0 {
            return Err(ProfileError::InvalidLead(self.spec.lead));
        }
        if samples < 2 {
            return Err(ProfileError::TooFewSamples(samples));
        }
        if let WormForm::Globoid(throat) = &self.form {
            throat.validate()?;
        }

        let half = total_length / 2.0;
        let h = (total_length * 1e-6).max(1e-9);
        let mut points = Vec::with_capacity(samples);
        for i in 0..samples {
            let t = i as f64 / (samples - 1) as f64;
            let z = -half + total_length * t;
            let position = self.evaluate(start_angle_deg, half, z);
            // Central finite difference for the tangent; the position
            // function extends smoothly past the sampled span.
            let ahead = self.evaluate(start_angle_deg, half, z + h);
            let behind = self.evaluate(start_angle_deg, half, z - h);
            let d = ahead - behind;
            let tangent = if d.norm() > 1e-12 {
                d.normalize()
            } else {
                Vec3::z()
            };
            points.push(PathPoint {
                position,
                tangent,
                t,
            });
        }
        Ok(points)
    }

    /// Path position at axial coordinate `z`.
    fn evaluate(&self, start_angle_deg: f64, half_length: f64, z: f64) -> Point3 {
        let axial_distance = z + half_length;
        let angle_deg =
            start_angle_deg + self.spec.hand_sign() * 360.0 * axial_distance / self.spec.lead;
        let angle = angle_deg.to_radians();
        let radius = self.radius_at(z);
        Point3::new(radius * angle.cos(), radius * angle.sin(), z)
    }

    /// Pitch-line radius at axial coordinate `z`.
    pub fn radius_at(&self, z: f64) -> f64 {
        match &self.form {
            WormForm::Cylindrical => self.spec.pitch_radius,
            WormForm::Globoid(throat) => {
                let rc = throat.wheel_pitch_radius;
                let throat_radius = throat.throat_pitch_radius();
                let nominal = self.spec.pitch_radius;
                let r = if z.abs() < rc {
                    throat_radius + rc - (rc * rc - z * z).sqrt()
                } else {
                    nominal
                };
                r.clamp(throat_radius, 1.05 * nominal)
            }
        }
    }
}

/// Reconstruct the lead from a sampled path by tracking the thread's
/// angular position along the axis. Returns the axial advance per full
/// turn; `0.0` for paths with no angular progress.
pub fn measured_lead(points: &[PathPoint]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let mut total_angle = 0.0;
    let mut prev = points[0].position.y.atan2(points[0].position.x);
    for p in &points[1..] {
        let angle = p.position.y.atan2(p.position.x);
        let mut delta = angle - prev;
        // Unwrap across the ±π seam.
        while delta > std::f64::consts::PI {
            delta -= 2.0 * std::f64::consts::PI;
        }
        while delta < -std::f64::consts::PI {
            delta += 2.0 * std::f64::consts::PI;
        }
        total_angle += delta;
        prev = angle;
    }
    if total_angle.abs() < 1e-9 {
        return 0.0;
    }
    let axial = points.last().unwrap().position.z - points[0].position.z;
    let turns = total_angle / (2.0 * std::f64::consts::PI);
    (axial / turns).abs()
}
