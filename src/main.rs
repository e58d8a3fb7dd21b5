use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use photopolar::common::JulianDate;
use photopolar::pole::FixedEpoch;
use photopolar::{
    AlignConfig, AlignmentPipeline, AlignmentReport, AxisFix, Header, Hemisphere, PixelPoint,
    PlateSolution,
};

#[derive(Parser)]
#[command(name = "ppa")]
#[command(about = "Photographic polar alignment from plate solved images")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML file overriding the default tunables
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Compute the pole for this Julian date instead of now
    #[arg(long, global = true)]
    jd: Option<f64>,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the RA axis from images taken before and after rotating in RA
    FindAxis {
        /// Solution (.wcs) of the first image
        #[arg(short, long)]
        first: PathBuf,

        /// Solution (.wcs) of the image after rotating the mount
        #[arg(short, long)]
        second: PathBuf,
    },

    /// Check a new image against an axis found earlier
    Improve {
        /// Solution (.wcs) of the image the axis was found in
        #[arg(short, long)]
        reference: PathBuf,

        /// Solution (.wcs) of the image after the Alt/Az adjustment
        #[arg(short, long)]
        image: PathBuf,

        /// Axis pixel as printed by find-axis, `x,y`
        #[arg(short, long, value_parser = parse_point)]
        axis: PixelPoint,

        #[arg(long, value_enum)]
        hemisphere: Pole,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Pole {
    North,
    South,
}
impl From<Pole> for Hemisphere {
    fn from(pole: Pole) -> Self {
        match pole {
            Pole::North => Hemisphere::North,
            Pole::South => Hemisphere::South,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_default_env()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        })
        .init();

    let config = match &cli.config {
        Some(path) => AlignConfig::load(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => AlignConfig::default(),
    };
    let mut pipeline = AlignmentPipeline::new(config);
    if let Some(jd) = cli.jd {
        pipeline = pipeline.with_clock(FixedEpoch(JulianDate::new(jd)));
    }

    match cli.command {
        Commands::FindAxis { first, second } => {
            let a = load_solution(&first)?;
            let b = load_solution(&second)?;
            let (fix, report) = pipeline.find_axis(&a, &b)?;
            print_report(&report);
            let pole = match fix.hemisphere {
                Hemisphere::North => "north",
                Hemisphere::South => "south",
            };
            println!(
                "Next:        improve --axis {},{} --hemisphere {pole}",
                fix.axis.x, fix.axis.y
            );
        }
        Commands::Improve {
            reference,
            image,
            axis,
            hemisphere,
        } => {
            let reference = load_solution(&reference)?;
            let image = load_solution(&image)?;
            let fix = AxisFix {
                axis,
                hemisphere: hemisphere.into(),
            };
            let report = pipeline.show_improvement(&fix, &reference, &image)?;
            print_report(&report);
        }
    }

    Ok(())
}

fn load_solution(path: &Path) -> anyhow::Result<PlateSolution> {
    let header = Header::from_path(path).with_context(|| format!("reading {}", path.display()))?;
    PlateSolution::from_header(&header).with_context(|| format!("solution in {}", path.display()))
}

fn parse_point(s: &str) -> Result<PixelPoint, String> {
    let (x, y) = s.split_once(',').ok_or("expected x,y")?;
    let x = x.trim().parse::<f64>().map_err(|e| e.to_string())?;
    let y = y.trim().parse::<f64>().map_err(|e| e.to_string())?;
    Ok(PixelPoint::new(x, y))
}

fn print_report(report: &AlignmentReport) {
    let result = &report.result;
    println!("{} celestial pole", report.hemisphere);
    println!("Scale:       {:.2} arcsec/pix", report.scale.arcsec_per_pixel());
    if !report.scale.is_reliable() {
        println!("             (no scale in solution, assumed)");
    }
    println!("RA axis:     {},{}", result.axis_px.x as i64, result.axis_px.y as i64);
    println!("Pole:        {},{}", result.pole_px.x as i64, result.pole_px.y as i64);
    println!("Error:       {:.2} arcmin", result.error_arcmin);
    println!("Move:        {}", result.correction_text);
    for marker in &report.markers {
        println!(
            "Star {:<11} [{}] at {},{}",
            marker.name, marker.label, marker.pixel.x as i64, marker.pixel.y as i64
        );
    }
    for (arcmin, radius) in report.rings {
        println!("Ring {arcmin:>2}'     radius {radius:.0} px");
    }
    let r = report.region;
    println!("Crop:        ({}, {}) - ({}, {})", r.x0, r.y0, r.x1, r.y1);
}
