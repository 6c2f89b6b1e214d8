use category_trends::config::{get_base_data_path, resolve_db_path};
use category_trends::db::SqliteSource;
use category_trends::logger::init_cli_logger;
use category_trends::plot::{default_svgout, parse_cli};
use category_trends::{plot_category_trends, SvgRenderer, TrendConfig, TrendOutcome};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let defaults = TrendConfig::default();
    let args = parse_cli(&defaults);
    init_cli_logger(args.verbose);

    let data_path = get_base_data_path();
    let db_path = resolve_db_path(&data_path, &args.db_name);
    let svgout = args
        .svgout
        .clone()
        .unwrap_or_else(|| default_svgout(&data_path, args.interval));
    println!("Using database: {}", db_path.display());
    tracing::debug!("cli arguments: {:?}", args);

    let source = SqliteSource::new(db_path);
    let renderer = SvgRenderer::new(svgout).with_show(args.show);
    let mut stdout = std::io::stdout();
    if let TrendOutcome::Rendered { categories } =
        plot_category_trends(&source, &renderer, args.interval, &mut stdout)?
    {
        println!(
            "plotted {} categories per {} to {}",
            categories,
            args.interval,
            renderer.fout.display()
        );
    }
    Ok(())
}
