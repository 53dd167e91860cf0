//! Numerically-stable associative combiners: the per-event `Data` wrapper
//! and its associative `Combine`, shared verbatim between the inception
//! operator and both window operators. Grounded on renoir's
//! Welford/Chen updates in `operator/variance.rs`, `operator/covariance.rs`
//! and `operator/pearson.rs`, generalized from renoir's `NoirData` pair-of-
//! columns shape to this crate's single `Value` (scalar or vector).

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::maybe::Maybe;
use crate::value::Value;

/// Which statistic an inception/window operator computes. Carries no
/// floating data itself (only flags), so it doubles as part of the
/// structural-equality key used by the identity map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatKind {
    Sum,
    Prod,
    Mean,
    Var { corrected: bool },
    Cov { corrected: bool },
    CovMatrix { corrected: bool },
}

/// The associative accumulator threaded through inception/window runs.
/// One variant per [`StatKind`]; the covariance cross-moment update is a
/// generalized Chan/Welford combine, verified against naive one-shot
/// covariance in this module's tests.
#[derive(Clone, Debug, PartialEq)]
pub enum AccData {
    Sum(Value),
    Prod(Value),
    Mean {
        n: f64,
        mean: Value,
    },
    Var {
        n: f64,
        mean: Value,
        s: Value,
        corrected: bool,
    },
    Cov {
        n: f64,
        mean_x: Value,
        mean_y: Value,
        c: Value,
        corrected: bool,
    },
    CovMatrix {
        n: f64,
        mean: Vec<f64>,
        c: Vec<f64>,
        dim: usize,
        corrected: bool,
    },
}

fn zero_like(v: &Value) -> Value {
    v.map(|_| 0.0)
}

impl AccData {
    /// Lift a raw input tuple into the per-event `Data` type.
    pub fn wrap(stat: StatKind, inputs: &[Value]) -> EngineResult<AccData> {
        match stat {
            StatKind::Sum => Ok(AccData::Sum(inputs[0].clone())),
            StatKind::Prod => Ok(AccData::Prod(inputs[0].clone())),
            StatKind::Mean => Ok(AccData::Mean {
                n: 1.0,
                mean: inputs[0].clone(),
            }),
            StatKind::Var { corrected } => Ok(AccData::Var {
                n: 1.0,
                mean: inputs[0].clone(),
                s: zero_like(&inputs[0]),
                corrected,
            }),
            StatKind::Cov { corrected } => {
                // shape check: x and y must agree
                let _ = inputs[0].zip_with(&inputs[1], |_, _| 0.0)?;
                Ok(AccData::Cov {
                    n: 1.0,
                    mean_x: inputs[0].clone(),
                    mean_y: inputs[1].clone(),
                    c: zero_like(&inputs[0]),
                    corrected,
                })
            }
            StatKind::CovMatrix { corrected } => {
                let v = inputs[0].as_vector()?;
                let dim = v.len();
                Ok(AccData::CovMatrix {
                    n: 1.0,
                    mean: v.to_vec(),
                    c: vec![0.0; dim * dim],
                    dim,
                    corrected,
                })
            }
        }
    }

    /// Fold two accumulators. Associative: `combine(combine(a,b),c) ==
    /// combine(a,combine(b,c))`, which is what lets the window operators
    /// retain only a logarithmic amount of partial folds.
    pub fn combine(a: &AccData, b: &AccData) -> EngineResult<AccData> {
        match (a, b) {
            (AccData::Sum(a), AccData::Sum(b)) => Ok(AccData::Sum(a.add(b)?)),
            (AccData::Prod(a), AccData::Prod(b)) => Ok(AccData::Prod(a.mul(b)?)),
            (
                AccData::Mean { n: na, mean: ma },
                AccData::Mean { n: nb, mean: mb },
            ) => {
                let nc = na + nb;
                let mean_c = weighted_mean(ma, *na, mb, *nb, nc)?;
                Ok(AccData::Mean { n: nc, mean: mean_c })
            }
            (
                AccData::Var {
                    n: na,
                    mean: ma,
                    s: sa,
                    corrected,
                },
                AccData::Var {
                    n: nb,
                    mean: mb,
                    s: sb,
                    ..
                },
            ) => {
                let nc = na + nb;
                let mean_c = weighted_mean(ma, *na, mb, *nb, nc)?;
                let d1 = mb.sub(ma)?;
                let d2 = mb.sub(&mean_c)?;
                let cross = d1.mul(&d2)?.scale(*nb);
                let s_c = sa.add(sb)?.add(&cross)?;
                Ok(AccData::Var {
                    n: nc,
                    mean: mean_c,
                    s: s_c,
                    corrected: *corrected,
                })
            }
            (
                AccData::Cov {
                    n: na,
                    mean_x: mxa,
                    mean_y: mya,
                    c: ca,
                    corrected,
                },
                AccData::Cov {
                    n: nb,
                    mean_x: mxb,
                    mean_y: myb,
                    c: cb,
                    ..
                },
            ) => {
                let nc = na + nb;
                let mean_xc = weighted_mean(mxa, *na, mxb, *nb, nc)?;
                let mean_yc = weighted_mean(mya, *na, myb, *nb, nc)?;
                let dx = mxb.sub(mxa)?;
                let dy = myb.sub(mya)?;
                let weight = if nc.abs() < f64::EPSILON {
                    0.0
                } else {
                    na * nb / nc
                };
                let cross = dx.mul(&dy)?.scale(weight);
                let c_c = ca.add(cb)?.add(&cross)?;
                Ok(AccData::Cov {
                    n: nc,
                    mean_x: mean_xc,
                    mean_y: mean_yc,
                    c: c_c,
                    corrected: *corrected,
                })
            }
            (
                AccData::CovMatrix {
                    n: na,
                    mean: mean_a,
                    c: ca,
                    dim: dim_a,
                    corrected,
                },
                AccData::CovMatrix {
                    n: nb,
                    mean: mean_b,
                    c: cb,
                    dim: dim_b,
                    ..
                },
            ) => {
                if dim_a != dim_b {
                    return Err(EngineError::type_mismatch(
                        format!("vector[{dim_a}]"),
                        format!("vector[{dim_b}]"),
                    ));
                }
                let dim = *dim_a;
                let nc = na + nb;
                let weight = if nc.abs() < f64::EPSILON {
                    0.0
                } else {
                    na * nb / nc
                };
                let mean_c: Vec<f64> = (0..dim)
                    .map(|i| mean_a[i] * (na / nc) + mean_b[i] * (nb / nc))
                    .collect();
                let mut c_c = vec![0.0; dim * dim];
                for i in 0..dim {
                    let dxi = mean_b[i] - mean_a[i];
                    for j in 0..dim {
                        let dyj = mean_b[j] - mean_a[j];
                        c_c[i * dim + j] = ca[i * dim + j] + cb[i * dim + j] + weight * dxi * dyj;
                    }
                }
                Ok(AccData::CovMatrix {
                    n: nc,
                    mean: mean_c,
                    c: c_c,
                    dim,
                    corrected: *corrected,
                })
            }
            _ => Err(EngineError::internal(
                "AccData::combine called on mismatched accumulator variants",
            )),
        }
    }

    /// Map the internal accumulator to the output value. Var/Cov/CovMatrix
    /// apply Bessel's correction when `corrected` is set.
    pub fn extract(&self) -> Value {
        match self {
            AccData::Sum(v) => v.clone(),
            AccData::Prod(v) => v.clone(),
            AccData::Mean { mean, .. } => mean.clone(),
            AccData::Var { n, s, corrected, .. } => {
                let divisor = if *corrected { n - 1.0 } else { *n };
                s.scale(1.0 / divisor)
            }
            AccData::Cov { n, c, corrected, .. } => {
                let divisor = if *corrected { n - 1.0 } else { *n };
                c.scale(1.0 / divisor)
            }
            AccData::CovMatrix {
                n, c, corrected, ..
            } => {
                let divisor = if *corrected { n - 1.0 } else { *n };
                Value::Vector(c.iter().map(|x| x / divisor).collect())
            }
        }
    }

    /// Per spec: Var/Cov/CovMatrix only tick once at least two events have
    /// been folded in; Sum/Prod/Mean tick on every event.
    pub fn should_tick(&self) -> bool {
        match self {
            AccData::Sum(_) | AccData::Prod(_) | AccData::Mean { .. } => true,
            AccData::Var { n, .. } | AccData::Cov { n, .. } | AccData::CovMatrix { n, .. } => {
                *n > 1.0
            }
        }
    }

    /// The per-step emission decision (spec.md §4.5's "inception/window
    /// emission rule"): `Maybe::Some(extract())` if this step should tick
    /// (`always_ticks`, or `should_tick` passes), `Maybe::None` otherwise.
    pub fn step(&self, always_ticks: bool) -> Maybe<Value> {
        if always_ticks || self.should_tick() {
            Maybe::some(self.extract())
        } else {
            Maybe::none()
        }
    }
}

fn weighted_mean(ma: &Value, na: f64, mb: &Value, nb: f64, nc: f64) -> EngineResult<Value> {
    ma.scale(na / nc).add(&mb.scale(nb / nc))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(x: f64) -> Value {
        Value::Scalar(x)
    }

    #[test]
    fn mean_matches_naive() {
        let xs = [2.0, 4.0, 6.0, 8.0];
        let mut acc = AccData::wrap(StatKind::Mean, &[s(xs[0])]).unwrap();
        for &x in &xs[1..] {
            let next = AccData::wrap(StatKind::Mean, &[s(x)]).unwrap();
            acc = AccData::combine(&acc, &next).unwrap();
        }
        let naive = xs.iter().sum::<f64>() / xs.len() as f64;
        assert!((acc.extract().as_scalar().unwrap() - naive).abs() < 1e-9);
    }

    #[test]
    fn var_matches_naive_sample_variance() {
        let xs = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let mut acc = AccData::wrap(StatKind::Var { corrected: true }, &[s(xs[0])]).unwrap();
        for &x in &xs[1..] {
            let next = AccData::wrap(StatKind::Var { corrected: true }, &[s(x)]).unwrap();
            acc = AccData::combine(&acc, &next).unwrap();
        }
        let mean = xs.iter().sum::<f64>() / xs.len() as f64;
        let naive = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (xs.len() as f64 - 1.0);
        assert!((acc.extract().as_scalar().unwrap() - naive).abs() < 1e-9);
    }

    #[test]
    fn cov_matches_naive() {
        let xs = [1.0, 2.0, 3.0, 4.0, 5.0];
        let ys = [2.0, 1.0, 4.0, 3.0, 7.0];
        let mut acc =
            AccData::wrap(StatKind::Cov { corrected: true }, &[s(xs[0]), s(ys[0])]).unwrap();
        for i in 1..xs.len() {
            let next =
                AccData::wrap(StatKind::Cov { corrected: true }, &[s(xs[i]), s(ys[i])]).unwrap();
            acc = AccData::combine(&acc, &next).unwrap();
        }
        let mx = xs.iter().sum::<f64>() / xs.len() as f64;
        let my = ys.iter().sum::<f64>() / ys.len() as f64;
        let naive = xs
            .iter()
            .zip(ys.iter())
            .map(|(x, y)| (x - mx) * (y - my))
            .sum::<f64>()
            / (xs.len() as f64 - 1.0);
        assert!((acc.extract().as_scalar().unwrap() - naive).abs() < 1e-9);
    }

    #[test]
    fn cov_matrix_dimension_drift_is_type_mismatch() {
        let a = AccData::wrap(
            StatKind::CovMatrix { corrected: true },
            &[Value::Vector(vec![1.0, 2.0])],
        )
        .unwrap();
        let b = AccData::wrap(
            StatKind::CovMatrix { corrected: true },
            &[Value::Vector(vec![1.0, 2.0, 3.0])],
        )
        .unwrap();
        assert!(matches!(
            AccData::combine(&a, &b),
            Err(EngineError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn var_step_suppresses_until_should_tick() {
        let one = AccData::wrap(StatKind::Var { corrected: true }, &[s(1.0)]).unwrap();
        assert_eq!(one.step(false), Maybe::none());

        let two = AccData::wrap(StatKind::Var { corrected: true }, &[s(2.0)]).unwrap();
        let combined = AccData::combine(&one, &two).unwrap();
        assert!(combined.step(false).is_some());
    }

    #[test]
    fn always_ticks_overrides_should_tick() {
        let one = AccData::wrap(StatKind::Var { corrected: true }, &[s(1.0)]).unwrap();
        assert!(one.step(true).is_some());
    }
}
