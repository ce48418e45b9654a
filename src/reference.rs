//! Static advisory reference material
//!
//! A fixed block of domain context appended to every assembled report
//! context: maturity-model milestones, funding benchmarks, and ownership
//! dynamics the agents are told to reference. Not caller-controlled.

pub const ADVISORY_REFERENCE: &str = "\
You are given detailed context about startup stages and fundraising (a venture \
maturity model), aggregated market data, and founder equity trends. Below is a pitch \
deck outline and relevant details for a startup. Provide a thorough analysis and \
feedback, referencing the maturity milestones, funding data, and ownership dynamics \
where appropriate. Identify any red flags, highlight strengths, and suggest how the \
startup could optimize its approach. Assume the audience is prospective investors and \
seasoned startup advisors.

Venture Maturity Model
Formation -> Validation -> Growth -> Maturity

Growth Stage: Concept | MVP | Growth | Scale
Fundraising Stage: Ideation | Friends & Family | Pre-Seed | Seed | Seed+ | Series A | Series B

Objective by stage:
\u{2022} Conceptual clarity on problem-solution alignment.
\u{2022} Validate product-market fit through early user feedback.
\u{2022} Build early traction and secure consistent revenue.
\u{2022} Strengthen traction, refine product features, and secure scalable growth channels.
\u{2022} Scale operations and achieve broader market penetration.
\u{2022} Expand market reach with operational efficiency, prepare for potential exit strategies.

Revenue by stage:
\u{2022} Pre-revenue.
\u{2022} Under $250K.
\u{2022} $250K - $2M.
\u{2022} $2M - $5M.
\u{2022} $5M - $25M.
\u{2022} $25M+ preparing for acquisition or strategic partnership.

Team size by stage:
\u{2022} 1-2 (founders).
\u{2022} 2-3 early team members in core roles.
\u{2022} 3-10, including sales, product, and customer support roles.
\u{2022} 11-15, with emerging leadership roles in sales and customer success.
\u{2022} 16-25+, dedicated team across all core functions.
\u{2022} 25+, fully structured with specialized department heads.

Market validation by stage:
\u{2022} Identify core problem areas and create initial hypotheses from basic market research.
\u{2022} Refine the problem through personal networks; early adopters validate the MVP.
\u{2022} Strong, consistent customer feedback reinforces product-market fit.
\u{2022} Validation expands across customer segments with scalable insights from data.
\u{2022} Recognized solution for critical problems; entrenched fit with high customer loyalty.

Financial planning by stage:
\u{2022} Basic budgeting focused on minimal costs and essential expenses only.
\u{2022} Preliminary budget for MVP completion and initial validation milestones.
\u{2022} Budgeting includes revenue forecasting, expense planning, and early unit economics.
\u{2022} Financial modeling for growth, tracking CAC, LTV, and cash flow.
\u{2022} Advanced financial modeling with unit economics guiding profitability.
\u{2022} Mature financial strategy with funding diversification aligned to exit preparation.

Funding-climate cautions:
\u{2022} Short runway (under ~18 months at planned burn) is a red flag; investors expect
  18-24 months between rounds.
\u{2022} Valuation expectations should match stage benchmarks; opacity around prior raises
  erodes investor confidence.
\u{2022} Founder ownership dilution ahead of benchmark for the stage invites scrutiny of
  cap-table health.

Exit-narrative guidance:
\u{2022} Identify 2-3 likely buyer profiles and the milestones that would trigger serious
  exit consideration.
\u{2022} Emphasize optionality: a business valuable enough to choose between acquisition,
  independence, or IPO.
\u{2022} Conclude with vision, not just exit economics.
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_block_is_nonempty_static_prose() {
        assert!(ADVISORY_REFERENCE.len() > 500);
        assert!(ADVISORY_REFERENCE.contains("Venture Maturity Model"));
    }
}
