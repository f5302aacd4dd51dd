use chrono::{DateTime, Utc};
use clap::Args;
use gigmatch::error::AppError;
use gigmatch::workflows::matching::{
    AssignmentMode, CandidacyFilter, CandidacyView, InMemoryStore, Job, MatchingService, NewJob,
    NewUser, Role,
};
use serde::Serialize;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Acceptance path to allow (dual_consent, client_assignment, both)
    #[arg(long)]
    pub(crate) mode: Option<AssignmentMode>,
    /// Match through worker and client consent instead of a direct assignment
    #[arg(long)]
    pub(crate) consent: bool,
    /// Print the final state as JSON instead of a narrated summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Debug, Serialize)]
struct DemoSummary {
    ran_at: DateTime<Utc>,
    assignment_mode: String,
    job: Job,
    candidacies: Vec<CandidacyView>,
    completed_works: Vec<(String, u32)>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let mode = args.mode.unwrap_or_default();
    let service = MatchingService::new(Arc::new(InMemoryStore::new()), mode);

    let owner = service.register_user(signup("Asha Client", "asha@example.com", Role::Client))?;
    let first = service.register_user(signup("Ravi Worker", "ravi@example.com", Role::Worker))?;
    let second = service.register_user(signup("Meera Worker", "meera@example.com", Role::Worker))?;

    let job = service.post_job(NewJob {
        owner_id: owner.id,
        title: "Fix kitchen wiring".to_string(),
        description: "Replace two sockets and trace a tripping circuit".to_string(),
        category: Some("electrical".to_string()),
        budget: 100,
        location: "Pune".to_string(),
    })?;
    println!("Posted job '{}' (budget {})", job.title, job.budget);

    let first_offer = service.apply(job.id, first.id)?;
    service.apply(job.id, second.id)?;
    println!("{} and {} applied", first.full_name, second.full_name);

    if args.consent {
        service.set_worker_consent(first_offer.id, first.id)?;
        service.set_client_consent(first_offer.id, owner.id)?;
        println!("{} and {} both consented", first.full_name, owner.full_name);
    } else {
        service.assign(job.id, first.id, owner.id)?;
        println!("{} assigned the job to {}", owner.full_name, first.full_name);
    }

    if let Err(err) = service.apply(job.id, second.id) {
        println!("Late application from {} refused: {err}", second.full_name);
    }

    let job = service.complete(job.id, owner.id)?;
    let candidacies = service
        .list_offers(CandidacyFilter {
            job_id: Some(job.id),
            worker_id: None,
        })?
        .iter()
        .map(|candidacy| candidacy.view())
        .collect::<Vec<_>>();
    let completed_works = [&owner, &first, &second]
        .into_iter()
        .map(|user| -> Result<(String, u32), AppError> {
            let stored = service.get_user(&user.id)?;
            Ok((stored.full_name, stored.completed_works))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let summary = DemoSummary {
        ran_at: Utc::now(),
        assignment_mode: mode.to_string(),
        job,
        candidacies,
        completed_works,
    };

    if args.json {
        let rendered = serde_json::to_string_pretty(&summary)
            .map_err(|err| AppError::Io(std::io::Error::other(err)))?;
        println!("{rendered}");
        return Ok(());
    }

    println!(
        "Job completed: {} (mode {})",
        summary.job.is_completed, summary.assignment_mode
    );
    for candidacy in &summary.candidacies {
        println!("  candidacy {} -> {}", candidacy.worker_id, candidacy.status);
    }
    for (name, count) in &summary.completed_works {
        println!("  {name}: {count} completed works");
    }
    Ok(())
}

fn signup(full_name: &str, email: &str, role: Role) -> NewUser {
    let is_worker = matches!(role, Role::Worker);
    NewUser {
        full_name: full_name.to_string(),
        email: email.to_string(),
        role,
        city: Some("Pune".to_string()),
        service_category: is_worker.then(|| "electrical".to_string()),
        experience_years: is_worker.then_some(5),
        hourly_rate: is_worker.then_some(350),
    }
}

