//! Prompt templates for the research pass and the seven report sections
//!
//! Placeholders use `{name}` syntax; literal braces (heading anchor tags)
//! are escaped as `{{` / `}}`. Every template's placeholders must resolve
//! from the request's base context plus `retrieved_context`.

use crate::models::SectionKey;

pub const RESEARCHER_SYSTEM: &str = "You are a specialized research agent. Provide factual \
details from the context. If data is missing or unknown, label it. Avoid using placeholders \
if real data is found.";

pub const SECTION_WRITER_SYSTEM: &str = "You are an expert report writer. Return only the \
requested headings in valid Markdown. If data is missing, say 'unknown' rather than \
placeholders.";

pub const RESEARCHER_TEMPLATE: &str = "\
You are tasked with researching the following company and gathering factual information. \
For any field missing data, explicitly say: 'the user did not provide the relevant information'.

Company Name: {company}
Industry: {industry}
Funding Stage: {funding_stage}
Additional Context:
{retrieved_context}

Research Objectives:
1) Market & Industry Overview
2) Customer Traction & Revenue
3) Financial & Growth Indicators
4) Go-To-Market & Competitive Position
5) Leadership & Team
6) Investor Alignment & Risks
7) Recommendations or Next Steps (High-Level)

Instructions:
\u{2022} Provide factual details wherever possible.
\u{2022} If any info is not found or not provided, say: 'the user did not provide the relevant information'.
\u{2022} Avoid drafting a final 'report'; simply present data.
\u{2022} This output will be appended to further sections.
";

pub const EXECUTIVE_SUMMARY_TEMPLATE: &str = "\
You are drafting **Section 1: Executive Summary & Investment Rationale** in Markdown. \
Incorporate real data from 'retrieved_context' where available. \
If data is missing, say: 'the user did not provide the relevant information'.

The company details:
- Founder Name: {founder_name}
- Company Name: {company}
- Company Type: {company_type}
- Company Provides: {company_description}

Retrieved Context:
{retrieved_context}

Your Template:

### **Section 1: Executive Summary & Investment Rationale** {{#section-1:-executive-summary-&-investment-rationale}}

#### Overview {{#overview}}
1. Brief overview of the company.
2. Mention revenue growth, traction, or market potential if known.
3. The scope of this assessment.

#### Key Investment Considerations {{#key-investment-considerations}}
- Summarize top considerations.

#### Investment Readiness Overview {{#investment-readiness-overview}}
| Investment Category | Assessment |
| :---- | :---- |
| Market Traction | \u{1F7E2} Strong |
| Financial Transparency | \u{1F7E1} Needs Refinement |
| Leadership Depth | \u{1F7E1} Moderate Risk |
| Exit Potential | \u{1F7E2} Favorable Pathways |

#### Investment Risks & Considerations {{#investment-risks-&-considerations}}
- Bullet list of notable risks.

#### Investment Recommendations & Next Steps {{#investment-recommendations-&-next-steps}}
Short general recommendations, then short-term, medium-term, long-term.

Instructions:
1. Output valid Markdown.
2. If data is not provided or missing, explicitly say: 'the user did not provide the relevant information'.
3. Use the headings/anchor tags exactly as shown.
";

pub const MARKET_TEMPLATE: &str = "\
You are drafting **Section 2: Market Opportunity & Competitive Landscape** in Markdown. \
If data is missing, explicitly say: 'the user did not provide the relevant information'.

Company: {company}
Retrieved Context:
{retrieved_context}

Your Template:

### **Section 2: Market Opportunity & Competitive Landscape** {{#section-2:-market-opportunity-&-competitive-landscape}}

#### Market Overview {{#market-overview}}
Summarize the market.

#### Market Size & Growth Projections: {{#market-size-&-growth-projections:}}
- **Total Addressable Market (TAM):**
- **Annual Growth Rate:**
- **Adoption Trends:**

#### Competitive Positioning {{#competitive-positioning}}
Highlight the company's advantages.

##### Competitive Landscape {{#competitive-landscape}}
| Competitor | Market Focus | Key Strengths | Challenges |
| ----- | ----- | ----- | ----- |
|  |  |  |  |

#### Market Fit Assessment {{#market-fit-assessment}}
| Market Factor | Assessment |
| ----- | ----- |
|  | \u{1F7E2} Strong |
|  | \u{1F7E1} Needs Expansion |

Instructions:
\u{2022} Provide valid Markdown.
\u{2022} If any data is missing, say: 'the user did not provide the relevant information'.
\u{2022} Keep the headings, subheadings, and anchor links exactly.
";

pub const FINANCIAL_TEMPLATE: &str = "\
You are drafting **Section 3: Financial Performance & Investment Readiness** in Markdown. \
If data is missing, say: 'the user did not provide the relevant information'.

Company: {company}
Retrieved Context:
{retrieved_context}

Your Template:

### **Section 3: Financial Performance & Investment Readiness** {{#section-3:-financial-performance-&-investment-readiness}}

#### **Revenue Growth & Profitability Overview** {{#revenue-growth-&-profitability-overview}}
| Metric | Company Performance | Industry Benchmark |
| ----- | ----- | ----- |
|  |  |  |

#### **Investment Raised & Fund Utilization** {{#investment-raised-&-fund-utilization}}
| Funding Stage | Company Status | Industry Benchmark |
| ----- | ----- | ----- |
| **Total Funding Raised** |  |  |
| **Planned Raise** |  |  |

**Investor Concerns:**
\u{26A0} (List 2\u{2013}3)

#### **Financial Risk Assessment** {{#financial-risk-assessment}}
| Risk Factor | Assessment |
| ----- | ----- |
| **Revenue Concentration Risk** | \u{1F7E1} Moderate |
| **Burn Rate & Cash Flow Stability** | \u{1F7E1} Requires Validation |

Instructions:
\u{2022} Use real data if present. If missing, say: 'the user did not provide the relevant information'.
\u{2022} Keep headings, subheadings, anchor tags exactly as shown.
";

pub const GTM_TEMPLATE: &str = "\
You are drafting **Section 4: Go-To-Market (GTM) Strategy & Customer Traction** in Markdown. \
If data is missing, say: 'the user did not provide the relevant information'.

Company: {company}
Retrieved Context:
{retrieved_context}

Your Template:

### **Section 4: Go-To-Market (GTM) Strategy & Customer Traction** {{#section-4:-go-to-market-(gtm)-strategy-&-customer-traction}}

#### **Customer Acquisition Strategy** {{#customer-acquisition-strategy}}
| Acquisition Channel | Performance | Challenges |
| ----- | ----- | ----- |
|  |  |  |

\u{2705} **Strengths:**
\u{26A0} **Challenges:**

#### **Customer Retention & Lifetime Value** {{#customer-retention-&-lifetime-value}}
| Retention Metric | Company Performance | Industry Benchmark |
| ----- | ----- | ----- |
| **Customer Retention Rate** |  |  |
| **Churn Rate** |  |  |

#### **GTM Performance Assessment** {{#gtm-performance-assessment}}
| Category | Performance | Assessment |
| ----- | ----- | ----- |
| **Lead Generation Efficiency** |  |  |
| **Customer Retention** |  |  |
| **Revenue Growth** |  |  |

Instructions:
\u{2022} Output valid Markdown.
\u{2022} If data is missing, say: 'the user did not provide the relevant information'.
\u{2022} Maintain headings, subheadings, anchor tags exactly.
";

pub const LEADERSHIP_TEMPLATE: &str = "\
You are drafting **Section 5: Leadership & Team** in Markdown. \
If any data is missing, say: 'the user did not provide the relevant information'.

Company: {company}
Retrieved Context:
{retrieved_context}

Your Template:

### **Section 5: Leadership & Team** {{#section-5:-leadership-&-team}}

#### **Leadership Expertise & Strategic Decision-Making** {{#leadership-expertise-&-strategic-decision-making}}
| Leadership Role | Experience & Contributions | Identified Gaps |
| ----- | ----- | ----- |
| **Co-Founder & CEO** |  |  |
| **Engineering & Product Development** |  |  |

\u{2705} **Strengths:**
\u{26A0} **Challenges:**

#### **Strategic Hiring Roadmap** {{#strategic-hiring-roadmap}}
| Role | Current Status | Planned Hiring Timeline | Impact |
| ----- | ----- | ----- | ----- |
|  |  |  |  |

#### **Leadership & Organizational Stability Assessment** {{#leadership-&-organizational-stability-assessment}}
| Leadership Category | Assessment |
| ----- | ----- |
| **Strategic Vision & Execution** | \u{1F7E2} Strong |
| **Team Stability & Succession Planning** | \u{1F7E1} Moderate Risk |

Instructions:
\u{2022} Return valid Markdown.
\u{2022} If data is missing, say: 'the user did not provide the relevant information'.
\u{2022} Keep headings, subheadings, anchor tags exactly as shown.
";

pub const INVESTOR_FIT_TEMPLATE: &str = "\
You are drafting **Section 6: Investor Fit, Exit Strategy & Funding Narrative** in Markdown. \
If any data is missing, say: 'the user did not provide the relevant information'.

Company: {company}
Retrieved Context:
{retrieved_context}

Your Template:

### **Section 6: Investor Fit, Exit Strategy & Funding Narrative** {{#section-6:-investor-fit,-exit-strategy-&-funding-narrative}}

#### **Investor Profile & Strategic Alignment** {{#investor-profile-&-strategic-alignment}}
**Ideal Investor Profile:**
\u{2705} **Venture Capital (VC) Firms**
\u{2705} **Private Equity (PE) Funds**

\u{26A0} **Investor Concerns:**
- Outline top concerns.

#### **Exit Strategy Analysis** {{#exit-strategy-analysis}}
| Exit Type | Viability | Potential Acquirers / Investors | Challenges |
| ----- | ----- | ----- | ----- |
| **M&A** |  |  |  |
| **IPO** |  |  |  |

#### **Investor Fit Assessment** {{#investor-fit-assessment}}
| Investment Factor | Assessment |
| ----- | ----- |
| **Scalability & ROI Potential** | \u{1F7E2} Strong |
| **Risk Profile for Investors** | \u{1F7E1} Moderate Risk |

Instructions:
\u{2022} Return valid Markdown.
\u{2022} If data is missing, say: 'the user did not provide the relevant information'.
\u{2022} Keep headings, subheadings, anchor links, and tables.
";

pub const RECOMMENDATIONS_TEMPLATE: &str = "\
You are drafting **Section 7: Final Recommendations & Next Steps** in Markdown. \
If data is missing, say: 'the user did not provide the relevant information'.

Company: {company}
Retrieved Context:
{retrieved_context}

Your Template:

### **Section 7: Final Recommendations & Next Steps** {{#section-7:-final-recommendations-&-next-steps}}

#### **Key Strengths Supporting Investment Consideration** {{#key-strengths-supporting-investment-consideration}}
\u{2705} **High Market Traction & Growth Metrics**
\u{2705} **Scalable Business Model**

#### **Key Investment Risks & Mitigation Strategies** {{#key-investment-risks-&-mitigation-strategies}}
\u{26A0} **Risk:**
* **Mitigation:**

#### **Prioritized Action Plan for Investment Readiness** {{#prioritized-action-plan-for-investment-readiness}}
| Priority Level | Action Item | Impact | Feasibility |
| ----- | ----- | ----- | ----- |
| **Short-Term (1-3 Months)** |  |  |  |
| **Medium-Term (3-6 Months)** |  |  |  |
| **Long-Term (6-12 Months)** |  |  |  |

#### **Investment Readiness & Market Positioning** {{#investment-readiness-&-market-positioning}}
| Category | Assessment |
| ----- | ----- |
| **Investment Readiness** | \u{1F7E2} Strong Alignment |
| **Leadership & Operational Scalability** | \u{1F7E1} Moderate Risk |

### **Final Investment Recommendation** {{#final-investment-recommendation}}
A short paragraph summarizing the final recommendation.

### **Next Steps for Investment Consideration** {{#next-steps-for-investment-consideration}}
1. ...
2. ...
3. ...

Instructions:
\u{2022} Provide valid Markdown.
\u{2022} If data is missing, say: 'the user did not provide the relevant information'.
\u{2022} Keep headings, subheadings, anchor tags exactly.
";

/// Template for a given section.
pub fn template_for(key: SectionKey) -> &'static str {
    match key {
        SectionKey::ExecutiveSummary => EXECUTIVE_SUMMARY_TEMPLATE,
        SectionKey::MarketOpportunity => MARKET_TEMPLATE,
        SectionKey::FinancialPerformance => FINANCIAL_TEMPLATE,
        SectionKey::GoToMarket => GTM_TEMPLATE,
        SectionKey::LeadershipTeam => LEADERSHIP_TEMPLATE,
        SectionKey::InvestorFit => INVESTOR_FIT_TEMPLATE,
        SectionKey::Recommendations => RECOMMENDATIONS_TEMPLATE,
    }
}
