//! Built-in stack and symbol sprite assembler.
//!
//! # Symbol
//!
//! ```text
//! <svg xmlns=...>
//!   <symbol id="home-1a2b3c4d" viewBox="0 0 24 24">...</symbol>
//! </svg>
//! ```
//!
//! # Stack
//!
//! Every shape is a nested `<svg>`, hidden unless it is the `:target` of the
//! fragment in the URL (`sprite.svg#home-1a2b3c4d`).

use std::path::{Path, PathBuf};

use crate::config::{ModeConfig, SpriteMode};
use crate::error::{Result, SpriteError};
use crate::svg::{ShapeGeometry, optimize_svg, parse_shape};
use crate::utils::hash::short_hex;

use super::{
    DATA_FILE, ResourceKind, ShapeData, ShapeLayout, SpriteAssembler, SpriteData, SpriteJob,
    SpriteOutput, SpriteResource,
};

const SVG_NS: &str = "http://www.w3.org/2000/svg";
const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// Length of the cache-busting hash in sprite file names.
const BUST_HASH_LEN: usize = 8;

const STACK_STYLE: &str = ":root>svg{display:none}:root>svg:target{display:inline}";

/// Default assembler shipped with the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinAssembler;

/// A parsed shape, ready to be laid out.
struct Prepared {
    id: String,
    base: String,
    geometry: ShapeGeometry,
}

impl SpriteAssembler for BuiltinAssembler {
    fn assemble(&self, job: &SpriteJob) -> Result<SpriteOutput> {
        let prepared = job
            .shapes
            .iter()
            .map(|shape| {
                let content = match &job.optimize {
                    Some(options) => optimize_svg(&shape.content, options)
                        .map_err(|err| assemble_error(job, &shape.path, &format!("{err:#}")))?,
                    None => shape.content.to_string(),
                };
                let geometry = parse_shape(&content)
                    .map_err(|err| assemble_error(job, &shape.path, &err.to_string()))?;
                Ok(Prepared {
                    id: shape.id.clone(),
                    base: file_stem(&shape.path),
                    geometry,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut output = SpriteOutput::default();
        for (mode, options) in &job.modes {
            let (document, shapes) = match mode {
                SpriteMode::Symbol => symbol_sprite(&prepared),
                SpriteMode::Stack => stack_sprite(&prepared),
            };
            let (data, resources) = emit(job, *mode, options, document, shapes)?;
            output.resources.extend(resources);
            output.data.insert(*mode, data);
        }
        Ok(output)
    }
}

fn emit(
    job: &SpriteJob,
    mode: SpriteMode,
    options: &ModeConfig,
    document: String,
    shapes: Vec<ShapeData>,
) -> Result<(SpriteData, [SpriteResource; 2])> {
    let file = sprite_file_name(options.sprite_stem(), options.bust(job.dev), &document);
    let dest = PathBuf::from(options.dest(mode));
    let data = SpriteData {
        mode,
        sprite: file.clone(),
        shapes,
    };
    let json = serde_json::to_string_pretty(&data).map_err(|err| SpriteError::Assemble {
        bucket: job.bucket,
        message: err.to_string(),
    })?;

    let resources = [
        SpriteResource {
            mode,
            kind: ResourceKind::Sprite,
            path: dest.join(file),
            contents: document,
        },
        SpriteResource {
            mode,
            kind: ResourceKind::Data,
            path: dest.join(DATA_FILE),
            contents: json,
        },
    ];
    Ok((data, resources))
}

fn symbol_sprite(shapes: &[Prepared]) -> (String, Vec<ShapeData>) {
    let mut document = format!(r#"<svg xmlns="{SVG_NS}" xmlns:xlink="{XLINK_NS}">"#);
    let mut data = Vec::with_capacity(shapes.len());

    for (i, shape) in shapes.iter().enumerate() {
        let geometry = &shape.geometry;
        let symbol = format!(
            r#"<symbol id="{}" viewBox="{}"{}>{}</symbol>"#,
            shape.id,
            geometry.view_box_attr(),
            geometry.extra_attrs(),
            geometry.inner
        );
        document.push_str(&symbol);
        data.push(shape_data(shape, i, shapes.len(), ShapeLayout::Symbol { svg: symbol }));
    }

    document.push_str("</svg>");
    (document, data)
}

fn stack_sprite(shapes: &[Prepared]) -> (String, Vec<ShapeData>) {
    let mut document =
        format!(r#"<svg xmlns="{SVG_NS}" xmlns:xlink="{XLINK_NS}"><style>{STACK_STYLE}</style>"#);
    let mut data = Vec::with_capacity(shapes.len());

    for (i, shape) in shapes.iter().enumerate() {
        let geometry = &shape.geometry;
        document.push_str(&format!(
            r#"<svg id="{}" width="{}" height="{}" viewBox="{}"{}>{}</svg>"#,
            shape.id,
            geometry.width,
            geometry.height,
            geometry.view_box_attr(),
            geometry.extra_attrs(),
            geometry.inner
        ));
        let fragment = format!("#{}", shape.id);
        data.push(shape_data(shape, i, shapes.len(), ShapeLayout::Stack { fragment }));
    }

    document.push_str("</svg>");
    (document, data)
}

fn shape_data(shape: &Prepared, index: usize, total: usize, layout: ShapeLayout) -> ShapeData {
    ShapeData {
        name: shape.id.clone(),
        base: shape.base.clone(),
        width: shape.geometry.width,
        height: shape.geometry.height,
        view_box: shape.geometry.view_box_attr(),
        first: index == 0,
        last: index + 1 == total,
        layout,
    }
}

/// `sprite.svg`, or `sprite.<hash>.svg` when cache busting.
fn sprite_file_name(stem: &str, bust: bool, document: &str) -> String {
    if bust {
        format!("{stem}.{}.svg", short_hex(document, BUST_HASH_LEN))
    } else {
        format!("{stem}.svg")
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn assemble_error(job: &SpriteJob, path: &Path, message: &str) -> SpriteError {
    SpriteError::Assemble {
        bucket: job.bucket,
        message: format!("{}: {message}", path.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprite::SpriteShape;
    use crate::svg::{Classification, OptimizeOptions};

    fn job(modes: &[SpriteMode], bust: bool, shapes: &[(&str, &str)]) -> SpriteJob {
        SpriteJob {
            bucket: Classification::Static,
            modes: modes
                .iter()
                .map(|m| {
                    let options = ModeConfig {
                        bust: Some(bust),
                        ..Default::default()
                    };
                    (*m, options)
                })
                .collect(),
            shapes: shapes
                .iter()
                .map(|(id, content)| SpriteShape {
                    path: PathBuf::from(format!("/icons/{}.svg", id.split('-').next().unwrap())),
                    id: id.to_string(),
                    content: (*content).into(),
                })
                .collect(),
            dev: false,
            optimize: None,
        }
    }

    const HOME: &str = r#"<svg viewBox="0 0 24 24" fill="none"><path d="M0 0"/></svg>"#;
    const STAR: &str = r#"<svg width="16" height="16"><circle r="8"/></svg>"#;

    #[test]
    fn test_symbol_sprite() {
        let job = job(&[SpriteMode::Symbol], false, &[("home-1", HOME), ("star-2", STAR)]);
        let output = BuiltinAssembler.assemble(&job).unwrap();

        assert_eq!(output.resources.len(), 2);
        let sprite = &output.resources[0];
        assert!(sprite.is_sprite());
        assert_eq!(sprite.path, PathBuf::from("symbol/sprite.svg"));
        assert!(sprite.contents.contains(
            r#"<symbol id="home-1" viewBox="0 0 24 24" fill="none"><path d="M0 0"/></symbol>"#
        ));
        assert!(sprite.contents.contains(r#"<symbol id="star-2" viewBox="0 0 16 16">"#));

        let data = output.data(SpriteMode::Symbol).unwrap();
        assert_eq!(data.sprite, "sprite.svg");
        assert_eq!(data.shapes.len(), 2);
        assert!(data.shapes[0].first && !data.shapes[0].last);
        assert!(data.shapes[1].last);
        assert_eq!(data.shapes[1].base, "star");
    }

    #[test]
    fn test_stack_sprite() {
        let job = job(&[SpriteMode::Stack], false, &[("home-1", HOME)]);
        let output = BuiltinAssembler.assemble(&job).unwrap();

        let sprite = &output.resources[0];
        assert_eq!(sprite.path, PathBuf::from("stack/sprite.svg"));
        assert!(sprite.contents.contains(STACK_STYLE));
        assert!(sprite.contents.contains(r#"<svg id="home-1" width="24" height="24""#));

        let data = output.data(SpriteMode::Stack).unwrap();
        assert_eq!(
            data.shapes[0].layout,
            ShapeLayout::Stack {
                fragment: "#home-1".to_string()
            }
        );
    }

    #[test]
    fn test_data_resource_is_json() {
        let job = job(&[SpriteMode::Symbol], false, &[("home-1", HOME)]);
        let output = BuiltinAssembler.assemble(&job).unwrap();

        let data = &output.resources[1];
        assert_eq!(data.kind, ResourceKind::Data);
        assert!(!data.is_sprite());
        assert_eq!(data.path, PathBuf::from("symbol").join(DATA_FILE));

        let parsed: SpriteData = serde_json::from_str(&data.contents).unwrap();
        assert_eq!(&parsed, output.data(SpriteMode::Symbol).unwrap());
    }

    #[test]
    fn test_bust_hashes_file_name() {
        let job = job(&[SpriteMode::Symbol], true, &[("home-1", HOME)]);
        let output = BuiltinAssembler.assemble(&job).unwrap();
        let name = &output.data(SpriteMode::Symbol).unwrap().sprite;

        assert!(name.starts_with("sprite."));
        assert!(name.ends_with(".svg"));
        assert_eq!(name.len(), "sprite..svg".len() + BUST_HASH_LEN);
    }

    #[test]
    fn test_both_modes() {
        let job = job(&SpriteMode::ALL, false, &[("home-1", HOME)]);
        let output = BuiltinAssembler.assemble(&job).unwrap();
        assert_eq!(output.resources.len(), 4);
        assert_eq!(output.data.len(), 2);
    }

    #[test]
    fn test_empty_job() {
        let job = job(&[SpriteMode::Symbol], false, &[]);
        let output = BuiltinAssembler.assemble(&job).unwrap();
        let data = output.data(SpriteMode::Symbol).unwrap();
        assert!(data.shapes.is_empty());
        assert!(output.resources[0].contents.ends_with("</svg>"));
    }

    #[test]
    fn test_malformed_shape() {
        let job = job(&[SpriteMode::Symbol], false, &[("bad-1", "<g/>")]);
        let err = BuiltinAssembler.assemble(&job).unwrap_err();
        assert!(matches!(err, SpriteError::Assemble { .. }));
        assert!(err.to_string().contains("bad.svg"));
    }

    #[test]
    fn test_optimize_pass() {
        let mut job = job(
            &[SpriteMode::Symbol],
            false,
            &[(
                "rect-1",
                r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10"><rect width="10" height="10"/></svg>"#,
            )],
        );
        job.optimize = Some(OptimizeOptions::default());
        let output = BuiltinAssembler.assemble(&job).unwrap();
        assert_eq!(output.data(SpriteMode::Symbol).unwrap().shapes.len(), 1);
    }
}
