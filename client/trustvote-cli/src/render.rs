use trustvote_client::countdown::dashboard_label;
use trustvote_client::results::ElectionResult;
use trustvote_client::slider::{Slider, Slot};
use trustvote_client::top_vote::TopVoteEntry;
use trustvote_client::voting::Ballot;
use trustvote_client::CandidateCard;
use trustvote_interface::{Election, Timestamp};

pub fn election_page(elections: &[Election], slider: &Slider, now: Timestamp) {
    if elections.is_empty() {
        println!("No elections found.");
        return;
    }
    println!("{:>4}  {:<32} {:<10} {:>10}", "ID", "TITLE", "STATUS", "ENDS IN");
    for slot in slider.page(elections) {
        match slot {
            Slot::Item(election) => println!(
                "{:>4}  {:<32} {:<10} {:>10}",
                election.id,
                truncate(&election.title, 32),
                election.status(now).to_string(),
                dashboard_label(election.start, election.end, now),
            ),
            Slot::Placeholder => println!("{:>4}  {:<32}", "-", "-"),
        }
    }
    if slider.has_navigation(elections.len()) {
        println!(
            "page {}/{}",
            slider.current_page(elections.len()) + 1,
            slider.page_count(elections.len())
        );
    }
}

pub fn ballot(ballot: &Ballot, now: Timestamp) {
    let election = &ballot.election;
    println!("#{} {}", election.id, election.title);
    println!("{}", election.description);
    println!("status: {}  ends in: {}", ballot.status(now), ballot.countdown(now));
    candidates(&ballot.candidates, false);
}

pub fn result(result: &ElectionResult, now: Timestamp) {
    let election = &result.election;
    println!("#{} {}", election.id, election.title);
    println!("{}", election.description);
    println!(
        "status: {}  ends in: {}  organizer: {}",
        result.status,
        result.countdown(now),
        election.organizer
    );
    println!(
        "voted: {} / {} ({}%)",
        result.voted(),
        result.eligible(),
        result.participation_percent()
    );
    candidates(&result.candidates, true);
}

pub fn top_vote(entries: &[(TopVoteEntry, &'static str)]) {
    if entries.is_empty() {
        println!("No active elections.");
        return;
    }
    println!(
        "{:>4}  {:<32} {:<10} {:>13}  {}",
        "ID", "TITLE", "STATUS", "PARTICIPATION", "OPEN"
    );
    for (entry, route) in entries {
        println!(
            "{:>4}  {:<32} {:<10} {:>12}%  {}",
            entry.election.id,
            truncate(&entry.election.title, 32),
            entry.status.to_string(),
            entry.participation_percent,
            route
        );
    }
}

fn candidates(cards: &[CandidateCard], with_votes: bool) {
    for card in cards {
        let candidate = &card.candidate;
        if with_votes {
            println!(
                "  [{}] {:<24} {:>6} votes  {}",
                candidate.id, candidate.name, candidate.votes, card.photo_url
            );
        } else {
            println!("  [{}] {:<24} {}", candidate.id, candidate.name, card.photo_url);
        }
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max - 1).collect();
    out.push('…');
    out
}
