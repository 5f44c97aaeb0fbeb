#![warn(missing_docs)]

//! Topology repair pipeline for gear solids.
//!
//! Loft and boolean chains occasionally hand back shapes the kernel calls
//! invalid. [`repair`] heals them with an ordered sequence of strategies,
//! stopping at the first one that yields a valid solid. Repair failure is
//! non-fatal: when every strategy is exhausted the original, still-invalid
//! solid is returned and the caller reads the outcome's validity flag.
//!
//! [`simplify`] is the lighter sibling, run proactively before expensive
//! booleans to bound face-count growth.

use wormcad_kernel::{KernelContext, KernelError, Solid};

/// The result of one repair run: which strategy produced the returned
/// solid and whether it is valid.
#[derive(Debug, Clone)]
pub struct RepairOutcome {
    /// The repaired (or original, when exhausted) solid.
    pub solid: Solid,
    /// Name of the strategy that produced `solid`.
    pub strategy: &'static str,
    /// Whether `solid` passes the kernel's validity check.
    pub valid: bool,
}

/// Heal an invalid solid.
///
/// Identity on already-valid input. Otherwise tries, in order:
/// unify coincident faces; sew faces into a closed shell plus solid-level
/// healing; shape-level healing of the unified shape; an interchange
/// round-trip through a scoped temporary file (removed on every exit
/// path). Never fails: if no strategy yields a valid solid, the original
/// input is returned with `valid == false`.
pub fn repair(ctx: &KernelContext, solid: &Solid) -> RepairOutcome {
    if ctx.is_valid(solid) {
        return RepairOutcome {
            solid: solid.clone(),
            strategy: "identity",
            valid: true,
        };
    }

    type Strategy<'a> = (
        &'static str,
        Box<dyn Fn() -> Result<Solid, KernelError> + 'a>,
    );
    let strategies: Vec<Strategy> = vec![
        ("unify-faces", Box::new(|| ctx.unify_faces(solid))),
        (
            "sew-and-solidify",
            Box::new(|| ctx.sew_and_solidify(solid).and_then(|s| ctx.heal(&s))),
        ),
        (
            "heal-unified",
            Box::new(|| ctx.unify_faces(solid).and_then(|s| ctx.heal(&s))),
        ),
        (
            "interchange-roundtrip",
            Box::new(|| interchange_round_trip(ctx, solid)),
        ),
    ];

    for (name, op) in strategies {
        match op() {
            Ok(candidate) if ctx.is_valid(&candidate) => {
                log::info!("repair succeeded via {name}");
                return RepairOutcome {
                    solid: candidate,
                    strategy: name,
                    valid: true,
                };
            }
            Ok(_) => log::debug!("repair strategy {name} left the solid invalid"),
            Err(e) => log::debug!("repair strategy {name} failed: {e}"),
        }
    }

    log::warn!("repair exhausted all strategies; returning original solid");
    RepairOutcome {
        solid: solid.clone(),
        strategy: "exhausted",
        valid: false,
    }
}

/// Lightweight cleanup used before expensive booleans: unify coincident
/// faces and drop degenerate ones. Falls back to the input unchanged if
/// even that fails.
pub fn simplify(ctx: &KernelContext, solid: &Solid) -> Solid {
    match ctx.unify_faces(solid) {
        Ok(s) => s,
        Err(e) => {
            log::debug!("simplify fell back to the input: {e}");
            solid.clone()
        }
    }
}

/// Export to the neutral interchange format and re-import, relying on the
/// importer's own normalization. The temporary directory is a scoped
/// resource, deleted on every exit path including errors.
fn interchange_round_trip(ctx: &KernelContext, solid: &Solid) -> Result<Solid, KernelError> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("repair.stl");
    ctx.export_interchange(solid, &path)?;
    ctx.import_interchange(&path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wormcad_math::{Point3, Vec3};
    use wormcad_mesh::{Mesh, Polygon, Vertex};

    fn valid_solid(ctx: &KernelContext) -> Solid {
        ctx.create_cylinder(5.0, 10.0).unwrap()
    }

    /// A cylinder with a stray unattached facet: invalid, but fixable by
    /// the sew strategy, which discards faces that stitch to nothing.
    fn fixable_solid() -> Solid {
        let mut mesh = Mesh::cylinder(5.0, 10.0, 32);
        mesh.polygons.push(Polygon::new(vec![
            Vertex::new(Point3::new(20.0, 0.0, 0.0), Vec3::z()),
            Vertex::new(Point3::new(21.0, 0.0, 0.0), Vec3::z()),
            Vertex::new(Point3::new(20.5, 0.5, 0.0), Vec3::z()),
        ]));
        Solid::from_mesh(mesh)
    }

    /// A cuboid missing one face: open surface no strategy can close.
    fn unfixable_solid() -> Solid {
        let mut mesh = Mesh::cuboid(2.0, 2.0, 2.0);
        mesh.polygons.pop();
        Solid::from_mesh(mesh)
    }

    #[test]
    fn test_repair_is_identity_on_valid_solid() {
        let ctx = KernelContext::default();
        let solid = valid_solid(&ctx);
        let outcome = repair(&ctx, &solid);
        assert!(outcome.valid);
        assert_eq!(outcome.strategy, "identity");
        assert!((ctx.volume(&outcome.solid) - ctx.volume(&solid)).abs() < 1e-9);
    }

    #[test]
    fn test_repair_is_idempotent() {
        let ctx = KernelContext::default();
        let solid = valid_solid(&ctx);
        let once = repair(&ctx, &solid);
        let twice = repair(&ctx, &once.solid);
        assert!(twice.valid);
        assert_eq!(twice.strategy, "identity");
        assert!((ctx.volume(&twice.solid) - ctx.volume(&once.solid)).abs() < 1e-9);
    }

    #[test]
    fn test_repair_fixes_sliver_facet() {
        let ctx = KernelContext::default();
        let solid = fixable_solid();
        assert!(!ctx.is_valid(&solid));
        let outcome = repair(&ctx, &solid);
        assert!(outcome.valid, "strategy: {}", outcome.strategy);
        assert!(ctx.is_valid(&outcome.solid));
    }

    #[test]
    fn test_repair_exhausted_returns_original() {
        let ctx = KernelContext::default();
        let solid = unfixable_solid();
        let before = solid.mesh().polygons.len();
        let outcome = repair(&ctx, &solid);
        assert!(!outcome.valid);
        assert_eq!(outcome.strategy, "exhausted");
        assert_eq!(outcome.solid.mesh().polygons.len(), before);
    }

    #[test]
    fn test_simplify_keeps_valid_solid_usable() {
        let ctx = KernelContext::default();
        let solid = valid_solid(&ctx);
        let simplified = simplify(&ctx, &solid);
        assert!(ctx.is_valid(&simplified));
        assert!(
            (ctx.volume(&simplified) - ctx.volume(&solid)).abs() < 0.5,
            "simplify should not change the shape materially"
        );
    }
}
