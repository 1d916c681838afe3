use anyhow::Context;
use log::warn;
use typedump::{loader::CilProvider, Dumper, Filters};

use crate::{
    app::Cli,
    commands::common::resolve_target,
    output::{print_output, SummaryOutput},
};

pub fn run(cli: &Cli) -> anyhow::Result<()> {
    let target = resolve_target(
        cli.path.as_deref(),
        cli.process.as_deref(),
        &cli.module,
        cli.output.as_deref(),
    )?;

    let filters = Filters::new(cli.class.as_deref(), cli.method.as_deref());
    let dumper = Dumper::new(CilProvider::default(), &target.output_dir);
    let summary = dumper
        .run(&target.module, &filters)
        .with_context(|| format!("failed to dump {}", target.module.display()))?;

    let output = SummaryOutput::from(&summary);
    print_output(&output, &cli.global, |out| {
        for failure in &out.failed_writes {
            warn!("Not written: {} ({})", failure.path, failure.error);
        }
        let unresolved = out
            .diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.severity == "ERROR")
            .count();
        if unresolved > 0 {
            warn!("{unresolved} type(s) could not be resolved and are missing from the output");
        }
    })
}
