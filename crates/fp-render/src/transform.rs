//! SVG `transform` attribute ⇄ `kurbo::Affine`.

use fp_core::emitter::format_num;
use kurbo::{Affine, Vec2};

/// Parse a transform list. Functions compose left to right, as in SVG;
/// unknown or malformed functions are skipped.
pub fn parse_transform(raw: &str) -> Affine {
    let mut affine = Affine::IDENTITY;
    let mut rest = raw.trim();

    while let Some(open) = rest.find('(') {
        let name = rest[..open].trim_matches(|c: char| c.is_whitespace() || c == ',');
        let Some(close) = rest[open..].find(')') else {
            break;
        };
        let args: Vec<f64> = rest[open + 1..open + close]
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .filter_map(|s| s.parse().ok())
            .collect();
        if let Some(op) = transform_function(name, &args) {
            affine = affine * op;
        }
        rest = &rest[open + close + 1..];
    }
    affine
}

fn transform_function(name: &str, args: &[f64]) -> Option<Affine> {
    let arg = |i: usize| args.get(i).copied();
    match (name, args.len()) {
        ("matrix", 6) => Some(Affine::new([
            args[0], args[1], args[2], args[3], args[4], args[5],
        ])),
        ("translate", 1 | 2) => Some(Affine::translate((arg(0)?, arg(1).unwrap_or(0.0)))),
        ("scale", 1 | 2) => {
            let sx = arg(0)?;
            Some(Affine::scale_non_uniform(sx, arg(1).unwrap_or(sx)))
        }
        ("rotate", 1) => Some(Affine::rotate(arg(0)?.to_radians())),
        ("rotate", 3) => {
            let center = Vec2::new(arg(1)?, arg(2)?);
            Some(
                Affine::translate(center)
                    * Affine::rotate(arg(0)?.to_radians())
                    * Affine::translate(-center),
            )
        }
        ("skewX", 1) => Some(Affine::skew(arg(0)?.to_radians().tan(), 0.0)),
        ("skewY", 1) => Some(Affine::skew(0.0, arg(0)?.to_radians().tan())),
        _ => None,
    }
}

/// Serialize as `translate(x,y)` when there is no linear part, else as a matrix.
pub fn format_transform(affine: Affine) -> String {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    let num = |v: f64| format_num(v as f32);
    if (a, b, c, d) == (1.0, 0.0, 0.0, 1.0) {
        format!("translate({},{})", num(e), num(f))
    } else {
        format!(
            "matrix({},{},{},{},{},{})",
            num(a),
            num(b),
            num(c),
            num(d),
            num(e),
            num(f)
        )
    }
}

/// The same transform with its translation replaced.
pub fn with_origin(affine: Affine, x: f32, y: f32) -> Affine {
    affine.with_translation(Vec2::new(f64::from(x), f64::from(y)))
}
