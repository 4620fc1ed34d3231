//! Export formats: PNG via the raster path, SVG and PDF as filled outlines.

use std::fmt::Write as _;
use std::str::FromStr;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use serde::{Deserialize, Serialize};
use tiny_skia::{Path, PathSegment, Point};
use tracing::warn;

use crate::cloud::WordCloud;
use crate::color::Color;
use crate::error::{Error, Result};
use crate::render::word_paths;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    Svg,
    Pdf,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Svg => "svg",
            ExportFormat::Pdf => "pdf",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "svg" => Ok(ExportFormat::Svg),
            "pdf" => Ok(ExportFormat::Pdf),
            _ => Err(Error::config(format!(
                "unsupported export format '{s}' (expected png, svg or pdf)"
            ))),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl WordCloud {
    pub fn export(&self, format: ExportFormat) -> Result<Vec<u8>> {
        match format {
            ExportFormat::Png => self.to_png(),
            ExportFormat::Svg => self.to_svg().map(String::into_bytes),
            ExportFormat::Pdf => self.to_pdf(),
        }
    }

    fn warn_vector_contour(&self, format: ExportFormat) {
        if self.contour.is_some() && self.mask.is_some() {
            warn!(%format, "contour is only drawn on raster output");
        }
    }

    pub fn to_svg(&self) -> Result<String> {
        self.warn_vector_contour(ExportFormat::Svg);
        let (width, height) = self.output_size();
        let mut svg = String::with_capacity(8192);

        let _ = write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
        );
        let _ = write!(
            svg,
            r#"<rect width="100%" height="100%" fill="{}"{}/>"#,
            self.background.to_hex(),
            opacity_attr("fill-opacity", self.background)
        );
        for (path, color) in word_paths(self)? {
            let _ = write!(
                svg,
                r#"<path d="{}" fill="{}"{}/>"#,
                svg_path_data(&path),
                color.to_hex(),
                opacity_attr("fill-opacity", color)
            );
        }
        svg.push_str("</svg>");
        Ok(svg)
    }

    /// A single page, one point per output pixel.
    pub fn to_pdf(&self) -> Result<Vec<u8>> {
        self.warn_vector_contour(ExportFormat::Pdf);
        let (width, height) = self.output_size();
        let (w, h) = (width as f32, height as f32);

        let mut ops = Vec::new();
        ops.extend(fill_color(self.background));
        ops.push(Operation::new(
            "re",
            vec![0.0f32.into(), 0.0f32.into(), w.into(), h.into()],
        ));
        ops.push(Operation::new("f", vec![]));
        for (path, color) in word_paths(self)? {
            ops.extend(fill_color(color));
            push_pdf_path(&mut ops, &path, h);
            ops.push(Operation::new("f", vec![]));
        }

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let content = Content { operations: ops };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.0f32.into(), 0.0f32.into(), w.into(), h.into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.compress();

        let mut out = Vec::new();
        doc.save_to(&mut out)
            .map_err(|e| Error::Pdf(e.to_string()))?;
        Ok(out)
    }
}

fn opacity_attr(name: &str, color: Color) -> String {
    if color.a == 255 {
        String::new()
    } else {
        format!(r#" {name}="{:.3}""#, color.opacity())
    }
}

fn svg_path_data(path: &Path) -> String {
    let mut d = String::new();
    for seg in path.segments() {
        let _ = match seg {
            PathSegment::MoveTo(p) => write!(d, "M{:.2} {:.2}", p.x, p.y),
            PathSegment::LineTo(p) => write!(d, "L{:.2} {:.2}", p.x, p.y),
            PathSegment::QuadTo(c, p) => {
                write!(d, "Q{:.2} {:.2} {:.2} {:.2}", c.x, c.y, p.x, p.y)
            }
            PathSegment::CubicTo(c1, c2, p) => write!(
                d,
                "C{:.2} {:.2} {:.2} {:.2} {:.2} {:.2}",
                c1.x, c1.y, c2.x, c2.y, p.x, p.y
            ),
            PathSegment::Close => write!(d, "Z"),
        };
    }
    d
}

fn fill_color(color: Color) -> [Operation; 1] {
    let c = |v: u8| Object::from(v as f32 / 255.0);
    [Operation::new("rg", vec![c(color.r), c(color.g), c(color.b)])]
}

/// Emits path operators with PDF's y-up axis; quadratics become cubics.
fn push_pdf_path(ops: &mut Vec<Operation>, path: &Path, page_height: f32) {
    let pt = |p: Point| -> Vec<Object> { vec![p.x.into(), (page_height - p.y).into()] };
    let mut current = Point::zero();
    let mut start = Point::zero();
    for seg in path.segments() {
        match seg {
            PathSegment::MoveTo(p) => {
                ops.push(Operation::new("m", pt(p)));
                current = p;
                start = p;
            }
            PathSegment::LineTo(p) => {
                ops.push(Operation::new("l", pt(p)));
                current = p;
            }
            PathSegment::QuadTo(q, p) => {
                let c1 = Point::from_xy(
                    current.x + 2.0 / 3.0 * (q.x - current.x),
                    current.y + 2.0 / 3.0 * (q.y - current.y),
                );
                let c2 = Point::from_xy(p.x + 2.0 / 3.0 * (q.x - p.x), p.y + 2.0 / 3.0 * (q.y - p.y));
                let mut operands = pt(c1);
                operands.extend(pt(c2));
                operands.extend(pt(p));
                ops.push(Operation::new("c", operands));
                current = p;
            }
            PathSegment::CubicTo(c1, c2, p) => {
                let mut operands = pt(c1);
                operands.extend(pt(c2));
                operands.extend(pt(p));
                ops.push(Operation::new("c", operands));
                current = p;
            }
            PathSegment::Close => {
                ops.push(Operation::new("h", vec![]));
                current = start;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiny_skia::PathBuilder;

    #[test]
    fn format_names_parse_case_insensitively() {
        assert_eq!("png".parse::<ExportFormat>().unwrap(), ExportFormat::Png);
        assert_eq!("SVG".parse::<ExportFormat>().unwrap(), ExportFormat::Svg);
        assert_eq!(" pdf ".parse::<ExportFormat>().unwrap(), ExportFormat::Pdf);
    }

    #[test]
    fn unknown_format_is_config_error() {
        let err = "xyz".parse::<ExportFormat>().unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("xyz"));
    }

    #[test]
    fn svg_path_data_uses_absolute_commands() {
        let mut pb = PathBuilder::new();
        pb.move_to(1.0, 2.0);
        pb.line_to(3.0, 4.0);
        pb.quad_to(5.0, 6.0, 7.0, 8.0);
        pb.close();
        let path = pb.finish().unwrap();
        assert_eq!(
            svg_path_data(&path),
            "M1.00 2.00L3.00 4.00Q5.00 6.00 7.00 8.00Z"
        );
    }

    #[test]
    fn pdf_path_flips_y_and_converts_quads() {
        let mut pb = PathBuilder::new();
        pb.move_to(0.0, 0.0);
        pb.quad_to(3.0, 3.0, 6.0, 0.0);
        pb.close();
        let path = pb.finish().unwrap();
        let mut ops = Vec::new();
        push_pdf_path(&mut ops, &path, 10.0);
        let names: Vec<_> = ops.iter().map(|o| o.operator.as_str()).collect();
        assert_eq!(names, ["m", "c", "h"]);
        let f = |o: &Object| o.as_float().unwrap();
        assert_eq!(f(&ops[0].operands[0]), 0.0);
        assert_eq!(f(&ops[0].operands[1]), 10.0);
        // First control point: 2/3 of the way to (3, 3), flipped.
        assert!((f(&ops[1].operands[0]) - 2.0).abs() < 1e-5);
        assert!((f(&ops[1].operands[1]) - 8.0).abs() < 1e-5);
        assert_eq!(ops[1].operands.len(), 6);
    }
}
