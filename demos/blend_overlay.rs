use arabic_wordcloud::{generate, CloudJob, StyleOptions, Workspace};

/// Expects the usual layout under the given root:
/// `Texts/<text>`, `Fonts/<font>`, `Masks/<mask>`.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let (Some(root), Some(text), Some(font), Some(mask)) =
        (args.next(), args.next(), args.next(), args.next())
    else {
        eprintln!("usage: blend_overlay <root> <text> <font> <mask> [mode]");
        std::process::exit(2);
    };
    let mode = args.next().unwrap_or_else(|| "Difference".to_string());

    let workspace = Workspace::new(root);
    let job = CloudJob::new(text, font, mask);
    let style = StyleOptions {
        contour_color: Some("white".into()),
        overlay_mode: Some(mode),
        seed: Some(7),
        ..StyleOptions::default()
    };

    let files = generate(&workspace, &job, &style)?;
    println!("Wrote {}", files.primary.display());
    if let Some(blended) = files.blended {
        println!("Wrote {}", blended.display());
    }
    Ok(())
}
