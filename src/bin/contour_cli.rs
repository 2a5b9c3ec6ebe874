#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(err) = native::run() {
        eprintln!("contour_cli error: {err}");
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use contour_engine::ContourEngine;
    use contour_engine::export::{DxfOptions, read_dxf, write_dxf_with};
    use contour_engine::pipeline::ContourOptions;
    use std::fs;
    use std::io::{self, BufWriter, Write};
    use std::path::{Path, PathBuf};

    const USAGE: &str = r#"contour_cli (contour-engine)

USAGE:
  contour_cli run <points-file> --interval <f64> [options]
  contour_cli inspect <dxf-file>

The points file holds one `X,Y,Z` triple per line; malformed lines are skipped.

OPTIONS (run):
  --interval <f64>     Elevation step between contour lines (required)
  --resolution <n>     Grid nodes per side (default 200)
  --precision <n>      Decimal places for DXF coordinates (default 10)
  --dxf <path>         Write the contour layers as R12 DXF
  --overwrite          Overwrite an existing DXF file
  -h, --help           Show this help
"#;

    pub fn run() -> Result<(), String> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let mut args = Args::new(args);

        let Some(command) = args.next() else {
            print_usage();
            return Ok(());
        };

        match command.as_str() {
            "run" => cmd_run(&mut args),
            "inspect" => cmd_inspect(&mut args),
            "-h" | "--help" | "help" => {
                print_usage();
                Ok(())
            }
            other => Err(format!("unknown command `{other}`\n\n{USAGE}")),
        }
    }

    fn print_usage() {
        println!("{USAGE}");
    }

    fn cmd_run(args: &mut Args) -> Result<(), String> {
        let points_path = PathBuf::from(args.next().ok_or("missing points file")?);

        let mut interval: Option<f64> = None;
        let mut resolution: Option<usize> = None;
        let mut dxf_options = DxfOptions::default();
        let mut dxf_path: Option<PathBuf> = None;
        let mut overwrite = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--interval" => interval = Some(args.number("--interval")?),
                "--resolution" => resolution = Some(args.number("--resolution")?),
                "--precision" => {
                    dxf_options = dxf_options.with_coordinate_precision(args.number("--precision")?);
                }
                "--dxf" => dxf_path = Some(PathBuf::from(args.value("--dxf")?)),
                "--overwrite" => overwrite = true,
                "-h" | "--help" => {
                    print_usage();
                    return Ok(());
                }
                other => return Err(format!("unknown option `{other}`\n\n{USAGE}")),
            }
        }

        let interval = interval.ok_or("--interval is required")?;
        let mut options = ContourOptions::new(interval);
        if let Some(resolution) = resolution {
            options = options.with_resolution(resolution);
        }

        let text = fs::read_to_string(&points_path)
            .map_err(|e| format!("read {}: {e}", points_path.display()))?;

        let mut engine = ContourEngine::new();
        engine.run_text(&text, &options).map_err(|e| e.to_string())?;
        let Some(output) = engine.last_output() else {
            return Err("engine produced no scene".to_string());
        };

        let stdout = io::stdout();
        let mut out = BufWriter::new(stdout.lock());
        let scene = &output.scene;
        let (z_min, z_max) = scene.value_range();
        writeln!(out, "{}", scene.metadata().title).map_err(|e| format!("write stdout: {e}"))?;
        writeln!(
            out,
            "points={} layers={} polylines={} range=[{z_min:.3}, {z_max:.3}]",
            scene.points().len(),
            scene.layer_count(),
            scene.polyline_count()
        )
        .map_err(|e| format!("write stdout: {e}"))?;
        for layer in scene.layers() {
            let closed = layer.polylines.iter().filter(|p| p.closed).count();
            writeln!(
                out,
                "  {:<24} z={:>10} polylines={} closed={closed}",
                layer.name,
                layer.label,
                layer.polylines.len()
            )
            .map_err(|e| format!("write stdout: {e}"))?;
        }
        out.flush().map_err(|e| format!("write stdout: {e}"))?;

        eprint!("{}", output.diagnostics);

        if let Some(path) = dxf_path.as_deref() {
            write_text_file(path, &write_dxf_with(scene, dxf_options), overwrite)?;
            eprintln!("wrote {}", path.display());
        }

        Ok(())
    }

    fn cmd_inspect(args: &mut Args) -> Result<(), String> {
        let path = PathBuf::from(args.next().ok_or("missing DXF file")?);
        let text = fs::read_to_string(&path).map_err(|e| format!("read {}: {e}", path.display()))?;
        let drawing = read_dxf(&text).map_err(|e| format!("parse {}: {e}", path.display()))?;

        for layer in &drawing.layers {
            let polylines: Vec<_> = drawing.polylines_on(layer).collect();
            let vertices: usize = polylines.iter().map(|p| p.vertices.len()).sum();
            println!("{layer}: polylines={} vertices={vertices}", polylines.len());
        }
        Ok(())
    }

    fn write_text_file(path: &Path, text: &str, overwrite: bool) -> Result<(), String> {
        if path.exists() && !overwrite {
            return Err(format!(
                "refusing to overwrite existing file {} (use --overwrite)",
                path.display()
            ));
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| format!("create dir {}: {e}", parent.display()))?;
        }
        fs::write(path, text).map_err(|e| format!("write {}: {e}", path.display()))
    }

    struct Args {
        args: Vec<String>,
        pos: usize,
    }

    impl Args {
        fn new(args: Vec<String>) -> Self {
            Self { args, pos: 0 }
        }

        fn next(&mut self) -> Option<String> {
            let arg = self.args.get(self.pos)?.clone();
            self.pos += 1;
            Some(arg)
        }

        fn value(&mut self, flag: &str) -> Result<String, String> {
            self.next().ok_or_else(|| format!("missing value for {flag}"))
        }

        fn number<T: std::str::FromStr>(&mut self, flag: &str) -> Result<T, String> {
            let raw = self.value(flag)?;
            raw.parse()
                .map_err(|_| format!("invalid value `{raw}` for {flag}"))
        }
    }
}
