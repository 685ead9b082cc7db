use anyhow::Context;
use clap::Parser;
use groupcrop_cli::{Args, QuestionSet, Session, SessionOptions};
use groupcrop_core::{GroupQueue, GroupingMode};
use log::info;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let questions = QuestionSet::load(&args.questions, args.grouping)
        .with_context(|| format!("loading questions from {}", args.questions.display()))?;

    let mode = match args.size_of_group {
        Some(size) => GroupingMode::FixedSize(size),
        None => GroupingMode::Folder,
    };
    let queue = GroupQueue::from_dir(&args.image_path, mode)
        .with_context(|| format!("scanning {}", args.image_path.display()))?;
    info!(
        "{} groups, largest holds {} images",
        queue.groups_total(),
        queue.max_group_size()
    );

    let session = Session::create(
        queue,
        &questions,
        SessionOptions {
            flip: args.flip,
            zoom: args.zoom,
            output_root: args.output_path.clone(),
        },
    )
    .context("starting session")?;

    println!("{}", session.queue());
    println!(
        "progress: {:.1}%",
        session.queue().percent_complete() * 100.0
    );
    Ok(())
}
