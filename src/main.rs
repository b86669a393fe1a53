use clap::Parser;
use std::process::ExitCode;

use fallwatch::analysers::{Analyser, fall::FallAnalyser, outage::OutageAnalyser};
use fallwatch::cli::Cli;
use fallwatch::frames::FrameSource;
use fallwatch::notify::{Dispatcher, SmsNotifier};
use fallwatch::output::{Output, fmt_frame};
use fallwatch::{json, output};

fn analyse(args: &Cli, source: &FrameSource) -> fallwatch::Result<u8> {
    let dispatcher = match &args.recipient {
        Some(recipient) => {
            Dispatcher::spawn(SmsNotifier::new(args.sender.clone(), recipient.clone()))
        }
        None => Dispatcher::disabled(),
    };

    let config = args.debouncer_config()?;
    let mut analysers: Vec<Box<dyn Analyser>> = vec![
        Box::new(FallAnalyser::new(config, args.confidence, dispatcher)?),
        Box::new(OutageAnalyser::new(args.outage_frames)),
    ];

    let num_frames = source.n_frames();
    let digits = num_frames.to_string().len();
    let progress = Output::new(args, num_frames as u64);

    for (frame_counter, frame) in source.frames().enumerate() {
        let frame_label = fmt_frame(frame_counter, digits);
        progress.inc();

        for analyser in analysers.iter_mut() {
            analyser.analyse(&frame_label, frame_counter, &frame);
        }
    }

    progress.finish();

    let frame_label = fmt_frame(num_frames, digits);
    let mut return_code = 0;
    for analyser in analysers.iter_mut() {
        return_code |= analyser.finish(&frame_label);
    }

    if let Some(path) = &args.json {
        json::write_json(path, &analysers)?;
    }

    Ok(return_code)
}

fn main() -> ExitCode {
    let args = Cli::parse();
    output::init_logging(args.debug);
    output::set_quiet(args.quiet);

    if !(args.fps.is_finite() && args.fps > 0.0) {
        eprintln!("Frame rate must be positive, got {}", args.fps);
        return ExitCode::from(1);
    }

    let source = match FrameSource::from_path(&args.input, args.fps) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("Could not read {}: {}", args.input, err);
            return ExitCode::from(1);
        }
    };

    output!("[+] frames:            {}", source.n_frames());
    output!(
        "[+] window:            {} frames, {} to decide, ratio > {}",
        args.capacity,
        args.min_samples,
        args.alert_ratio
    );
    output!("[+] cooldown:          {}s", args.cooldown);
    output!("[+] confidence:        > {}", args.confidence);
    match &args.recipient {
        Some(recipient) => output!("[+] alerts to:         {}", recipient),
        None => output!("[+] alerts to:         (not sent)"),
    }

    match analyse(&args, &source) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::from(1)
        }
    }
}
