//! RA axis locator
//!
//! Rotating the mount about its RA axis moves every star in the image except
//! the one sitting on the axis. With image A taken before and image B after
//! the rotation, the axis is the pixel `p` where
//!
//! ```text
//! displacement(p) = sky_to_pixel_B(pixel_to_sky_A(p)) - p = 0
//! ```
//!
//! The root is found with Broyden's method seeded at the image centre.

use glam::{DMat2, DVec2};
use log::debug;

use crate::config::LocatorConfig;
use crate::error::{AxisError, Result};
use crate::gate::{self, Hemisphere};
use crate::math::PixelPoint;
use crate::solution::PlateSolution;

/// A located root
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Root {
    pub x: DVec2,
    pub iterations: usize,
    /// Norm of `f(x)`
    pub residual: f64,
}

/// Derivative free solver for `f(x) = 0` in two dimensions
///
/// `f` returns `None` where it is undefined, e.g. off the projection.
pub trait RootFinder {
    fn solve(
        &self,
        f: &mut dyn FnMut(DVec2) -> Option<DVec2>,
        seed: DVec2,
    ) -> Result<Root, AxisError>;
}

/// Broyden's ("good") method with a forward difference starting Jacobian
#[derive(Debug, Default, Clone, Copy)]
pub struct Broyden {
    config: LocatorConfig,
}

impl Broyden {
    pub fn new(config: LocatorConfig) -> Self {
        Self { config }
    }
}

impl RootFinder for Broyden {
    fn solve(
        &self,
        f: &mut dyn FnMut(DVec2) -> Option<DVec2>,
        seed: DVec2,
    ) -> Result<Root, AxisError> {
        let cfg = &self.config;
        let mut eval = |x: DVec2, iterations: usize, residual: f64| {
            f(x).filter(|fx| fx.is_finite())
                .ok_or(AxisError::AxisNotFound {
                    iterations,
                    residual,
                })
        };

        let mut x = seed;
        let mut fx = eval(x, 0, f64::INFINITY)?;

        let h = cfg.probe_step_px;
        let dfdx = (eval(x + DVec2::new(h, 0.0), 0, fx.length())? - fx) / h;
        let dfdy = (eval(x + DVec2::new(0.0, h), 0, fx.length())? - fx) / h;
        let jacobian = DMat2::from_cols(dfdx, dfdy);
        let det = jacobian.determinant();
        debug!("Initial Jacobian {:?}, det {:.3e}", jacobian.to_cols_array(), det);
        if !(det.abs() > cfg.singular_threshold) {
            return Err(AxisError::DegenerateRotation);
        }
        let mut h_inv = jacobian.inverse();

        for iteration in 0..=cfg.max_iterations {
            let residual = fx.length();
            debug!("Iteration {iteration}: x = {x:?}, |f| = {residual:.3e}");
            if residual < cfg.tolerance_px {
                return Ok(Root {
                    x,
                    iterations: iteration,
                    residual,
                });
            }
            if iteration == cfg.max_iterations {
                break;
            }

            let dx = -(h_inv * fx);
            let dx_sq = dx.length_squared();
            // The step has shrunk below what the transforms can resolve
            if dx_sq.sqrt() < cfg.tolerance_px {
                return Ok(Root {
                    x: x + dx,
                    iterations: iteration + 1,
                    residual,
                });
            }
            let x_new = x + dx;
            let f_new = eval(x_new, iteration + 1, residual)?;

            // Sherman-Morrison update of the inverse Jacobian
            let h_df = h_inv * (f_new - fx);
            let denom = dx.dot(h_df);
            x = x_new;
            fx = f_new;
            if fx.length() < cfg.tolerance_px {
                continue;
            }
            if !(denom.abs() > cfg.singular_threshold * dx_sq) {
                return Err(AxisError::DegenerateRotation);
            }
            h_inv += outer(dx - h_df, h_inv.transpose() * dx) * (1.0 / denom);
        }

        Err(AxisError::AxisNotFound {
            iterations: cfg.max_iterations,
            residual: fx.length(),
        })
    }
}

/// `u v^T`
fn outer(u: DVec2, v: DVec2) -> DMat2 {
    DMat2::from_cols(u * v.x, u * v.y)
}

/// Where the RA axis is, and which pole it should point at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisFix {
    pub axis: PixelPoint,
    pub hemisphere: Hemisphere,
}

/// Find the pixel of `a` that `b` maps onto itself
pub fn locate_axis(
    a: &PlateSolution,
    b: &PlateSolution,
    finder: &dyn RootFinder,
) -> Result<PixelPoint, AxisError> {
    let (ta, tb) = (a.transform(), b.transform());
    let mut displacement = |p: DVec2| {
        let sky = ta.pixel_to_sky(p.into())?;
        let q = tb.sky_to_pixel(&sky)?;
        Some(*q - p)
    };

    let seed = a.size().center();
    let root = finder.solve(&mut displacement, *seed)?;
    debug!(
        "RA axis at {:?} after {} iterations (residual {:.3e} px)",
        root.x, root.iterations, root.residual
    );
    Ok(root.x.into())
}

/// Reuse an axis found earlier for an image taken after adjusting the mount
///
/// The camera has not moved relative to the RA axis, so neither has the axis
/// pixel. `reference` is the image the axis was located in.
pub fn locate_axis_single(
    fix: &AxisFix,
    reference: &PlateSolution,
    image: &PlateSolution,
) -> Result<PixelPoint> {
    gate::check_improvement(reference, image)?;
    Ok(fix.axis)
}
