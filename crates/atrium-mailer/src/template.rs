use chrono::NaiveDate;

use atrium_types::models::Appointment;

/// Fixed confirmation template. Inline styles only; mail clients strip
/// stylesheets.
pub fn confirmation_html(
    appointment: &Appointment,
    date: NaiveDate,
    time: &str,
    company: &str,
) -> String {
    let pretty_date = date.format("%B %d, %Y");

    format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <div style="background-color: #2563eb; padding: 20px; text-align: center;">
    <h1 style="color: white; margin: 0;">{company}</h1>
  </div>
  <div style="padding: 30px; background-color: #f8fafc;">
    <h2 style="color: #1e40af;">Appointment Confirmed!</h2>
    <p>Dear {name},</p>
    <p>Your appointment has been confirmed. Please find the details below:</p>

    <div style="background-color: white; padding: 20px; border-radius: 8px; margin: 20px 0;">
      <h3 style="color: #2563eb; margin-top: 0;">Appointment Details</h3>
      <p><strong>Date:</strong> {pretty_date}</p>
      <p><strong>Time:</strong> {time}</p>
      <p><strong>Consultation Type:</strong> {consultation_type}</p>
      <p><strong>Preferred Country:</strong> {preferred_country}</p>
    </div>

    <div style="background-color: #dbeafe; padding: 15px; border-radius: 8px; margin: 20px 0;">
      <h4 style="color: #1e40af; margin-top: 0;">Office Address</h4>
      <p style="margin: 5px 0;">{company} Office</p>
      <p style="margin: 5px 0;">123 Business District</p>
    </div>

    <p>Please arrive 10 minutes early. For reschedules, reply to this email at least 24 hours in advance.</p>
    <p>Thank you for choosing {company}!</p>

    <div style="margin-top: 30px; padding-top: 20px; border-top: 1px solid #e5e7eb;">
      <p style="color: #6b7280; font-size: 14px;">Best regards,<br>{company} Team</p>
    </div>
  </div>
</div>"#,
        company = company,
        name = appointment.name,
        pretty_date = pretty_date,
        time = time,
        consultation_type = appointment.consultation_type,
        preferred_country = appointment.preferred_country,
    )
}

pub fn probe_html(company: &str) -> String {
    format!("<p>If you received this, outbound mail from {company} is working.</p>")
}
