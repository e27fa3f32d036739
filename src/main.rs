use anyhow::{bail, Context, Result};
use std::env;

use cadastro_form::{
    logging, mask, search, ElementId, FieldKind, FormController, FormDocument, FormEvent,
    EventOutcome, InMemoryForm, LogConfig, LookupConfig, LookupOutcome, ViaCepClient,
};

const USAGE: &str = "\
Usage:
  cadastro-form mask <cpf|telefone|cep|nome> <value>
  cadastro-form lookup <cep>
  cadastro-form search <query> <value>...";

#[tokio::main]
async fn main() -> Result<()> {
    logging::init(&LogConfig::from_env().context("Invalid logging configuration")?);

    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("mask") => run_mask(&args[2..])?,
        Some("lookup") => run_lookup(&args[2..]).await?,
        Some("search") => run_search(&args[2..])?,
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }

    Ok(())
}

fn run_mask(args: &[String]) -> Result<()> {
    let (Some(kind), Some(value)) = (args.first(), args.get(1)) else {
        bail!("missing arguments\n{}", USAGE);
    };
    let kind = FieldKind::from_code(kind)
        .with_context(|| format!("Unknown field kind: {}", kind))?;

    println!("{}", mask(kind, value));
    Ok(())
}

/// Print the values a dashboard search would list (CPF/telefone match digit-to-digit)
fn run_search(args: &[String]) -> Result<()> {
    let Some((query, values)) = args.split_first() else {
        bail!("missing query\n{}", USAGE);
    };

    let matches = search(values.iter().map(String::as_str), query);
    for value in &matches {
        println!("{}", value);
    }
    if matches.is_empty() {
        eprintln!("🔍 Nenhum resultado para {:?}", query);
        std::process::exit(1);
    }
    Ok(())
}

async fn run_lookup(args: &[String]) -> Result<()> {
    let Some(raw) = args.first() else {
        bail!("missing CEP\n{}", USAGE);
    };

    let config = LookupConfig::from_env().context("Invalid lookup configuration")?;
    let client = ViaCepClient::new(&config).context("Failed to build HTTP client")?;

    // Same flow as the page: type the CEP, let the mask run, press Enter
    let form = InMemoryForm::registration();
    let controller = FormController::attach(&form, client);

    form.type_into(ElementId::Cep, raw);
    controller.dispatch(&form, FormEvent::Input(ElementId::Cep)).await;

    println!("📮 Buscando CEP {}...", form.value(ElementId::Cep).unwrap_or_default());
    let event = FormEvent::KeyPress {
        target: ElementId::Cep,
        key: "Enter".to_string(),
    };
    let outcome = match controller.dispatch(&form, event).await {
        EventOutcome::Lookup { outcome, .. } => outcome,
        other => bail!("lookup did not run: {:?}", other),
    };

    for alert in form.take_alerts() {
        eprintln!("⚠️  {}", alert);
    }

    match outcome {
        LookupOutcome::Filled(_) => {
            println!("✓ Endereço: {}", form.value(ElementId::Street).unwrap_or_default());
            println!("✓ Cidade:   {}", form.value(ElementId::City).unwrap_or_default());
            println!("✓ Estado:   {}", form.value(ElementId::State).unwrap_or_default());
            Ok(())
        }
        LookupOutcome::NotFound => std::process::exit(1),
        LookupOutcome::Rejected(err) => bail!(err),
        LookupOutcome::NetworkError(err) => bail!("lookup failed: {}", err),
    }
}
